pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// A message received from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    /// Sender, absent for channel posts
    pub user_id: Option<u64>,
    /// Platform message ID, used to reply in-thread
    pub message_id: i32,
    /// The message text, absent for media and service messages
    pub text: Option<String>,
}

/// What a handler wants sent back to the chat the message came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Plain message to the chat
    Text(String),
    /// Message quoting the user's original message
    Reply(String),
    /// Image with a caption
    Photo { image: Vec<u8>, caption: String },
}

/// Outbound side of the chat platform
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()>;

    async fn send_image(&self, chat_id: i64, image: Vec<u8>, caption: &str) -> Result<()>;

    /// Deliver `outbound` in response to `incoming`
    async fn deliver(&self, incoming: &IncomingMessage, outbound: Outbound) -> Result<()> {
        match outbound {
            Outbound::Text(text) => self.send_text(incoming.chat_id, &text, None).await,
            Outbound::Reply(text) => {
                self.send_text(incoming.chat_id, &text, Some(incoming.message_id))
                    .await
            }
            Outbound::Photo { image, caption } => {
                self.send_image(incoming.chat_id, image, &caption).await
            }
        }
    }
}

/// Inbound side of the chat platform: one long-poll receive per call
#[async_trait]
pub trait UpdateSource: Send {
    async fn receive(&mut self) -> Result<Vec<IncomingMessage>>;
}
