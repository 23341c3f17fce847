use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::{GetUpdatesSetters, SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, InputFile, MessageId, ReplyParameters, Update, UpdateKind};
use tracing::{debug, info};

use crate::config::PollingConfig;
use crate::platform::{ChatSink, IncomingMessage, UpdateSource};

/// Bot whose HTTP client waits longer than the long-poll timeout.
/// teloxide's default client gives up after 17 s, shorter than a 30 s poll.
pub fn build_bot(token: &str, polling: &PollingConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(polling.client_timeout())
        .build()
        .context("Failed to build Telegram HTTP client")?;
    Ok(Bot::with_client(token, client))
}

/// Convert a Telegram update into a platform-agnostic message.
/// Anything other than a new message is ignored.
pub fn incoming_from_update(update: Update) -> Option<IncomingMessage> {
    let msg = match update.kind {
        UpdateKind::Message(msg) => msg,
        _ => return None,
    };

    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        user_id: msg.from.as_ref().map(|user| user.id.0),
        message_id: msg.id.0,
        text: msg.text().map(str::to_string),
    })
}

/// Long-polls `getUpdates` and tracks the update offset.
pub struct TelegramPoller {
    bot: Bot,
    offset: i32,
    timeout_secs: u32,
    skip_pending: bool,
    primed: bool,
}

impl TelegramPoller {
    pub fn new(bot: Bot, polling: &PollingConfig) -> Self {
        Self {
            bot,
            offset: 0,
            timeout_secs: polling.long_poll_timeout_secs,
            skip_pending: polling.skip_pending,
            primed: false,
        }
    }

    fn advance(&mut self, update: &Update) {
        self.offset = self.offset.max(update.id.0 as i32 + 1);
    }

    /// Jump past every update queued before startup.
    async fn drop_pending(&mut self) -> Result<()> {
        let latest = self
            .bot
            .get_updates()
            .offset(-1)
            .limit(1)
            .timeout(0)
            .await
            .context("Failed to fetch pending updates")?;

        if let Some(update) = latest.last() {
            self.advance(update);
            info!("Skipped pending updates up to {}", update.id.0);
        }
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramPoller {
    async fn receive(&mut self) -> Result<Vec<IncomingMessage>> {
        if !self.primed {
            if self.skip_pending {
                self.drop_pending().await?;
            }
            self.primed = true;
        }

        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(self.timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .context("Failed to receive updates")?;

        debug!("Received {} update(s)", updates.len());

        let mut messages = Vec::with_capacity(updates.len());
        for update in updates {
            self.advance(&update);
            if let Some(message) = incoming_from_update(update) {
                messages.push(message);
            }
        }
        Ok(messages)
    }
}

#[async_trait]
impl ChatSink for Bot {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
        let mut request = self.send_message(ChatId(chat_id), text);
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
        }
        request
            .await
            .with_context(|| format!("Failed to send message to chat {}", chat_id))?;
        Ok(())
    }

    async fn send_image(&self, chat_id: i64, image: Vec<u8>, caption: &str) -> Result<()> {
        let photo = InputFile::memory(image).file_name("page.png");
        self.send_photo(ChatId(chat_id), photo)
            .caption(caption)
            .await
            .with_context(|| format!("Failed to send photo to chat {}", chat_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_message_conversion() {
        let incoming = incoming_from_update(update(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 5,
                    "date": 1700000000,
                    "chat": {"id": 42, "type": "private", "first_name": "Amina"},
                    "from": {"id": 7, "is_bot": false, "first_name": "Amina"},
                    "text": "12"
                }
            }"#,
        ))
        .unwrap();

        assert_eq!(
            incoming,
            IncomingMessage {
                chat_id: 42,
                user_id: Some(7),
                message_id: 5,
                text: Some("12".to_string()),
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_idle_long_poll_is_not_a_failure() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", mockito::Matcher::Regex(r"(?i)/getupdates$".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(|w| {
                // Telegram holds an idle poll open until its timeout
                std::thread::sleep(std::time::Duration::from_secs(18));
                w.write_all(br#"{"ok": true, "result": []}"#)
            })
            .create_async()
            .await;

        let polling = PollingConfig {
            skip_pending: false,
            ..PollingConfig::default()
        };
        let bot = build_bot("123:TEST", &polling)
            .unwrap()
            .set_api_url(server.url().parse().unwrap());
        let mut poller = TelegramPoller::new(bot, &polling);

        let messages = poller.receive().await.unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_edited_message_ignored() {
        let incoming = incoming_from_update(update(
            r#"{
                "update_id": 11,
                "edited_message": {
                    "message_id": 5,
                    "date": 1700000000,
                    "edit_date": 1700000100,
                    "chat": {"id": 42, "type": "private", "first_name": "Amina"},
                    "from": {"id": 7, "is_bot": false, "first_name": "Amina"},
                    "text": "13"
                }
            }"#,
        ));
        assert!(incoming.is_none());
    }
}
