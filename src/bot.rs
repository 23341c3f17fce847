use std::sync::Arc;

use tracing::{debug, error, info};

use crate::commands::Command;
use crate::content::ContentSource;
use crate::handlers;
use crate::platform::{ChatSink, IncomingMessage, Outbound};

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct BotContext {
    content: Arc<dyn ContentSource>,
    sink: Arc<dyn ChatSink>,
}

impl BotContext {
    pub fn new(content: Arc<dyn ContentSource>, sink: Arc<dyn ChatSink>) -> Self {
        Self { content, sink }
    }

    /// Pick the handler for `msg` and run it. Non-text messages get no reply.
    pub async fn respond(&self, msg: &IncomingMessage) -> Option<Outbound> {
        let text = msg.text.as_deref()?;

        info!(
            "Message from user {:?} in chat {}: {}",
            msg.user_id, msg.chat_id, text
        );

        let outbound = match Command::classify(text) {
            Command::Start => handlers::welcome(),
            Command::Hadith => handlers::random_hadith(self.content.as_ref()).await,
            Command::Page(requested) => handlers::page(self.content.as_ref(), requested).await,
            Command::Fallback => handlers::fallback(),
        };
        Some(outbound)
    }

    /// Respond to `msg` and deliver the reply. Send failures are logged only.
    pub async fn handle(&self, msg: &IncomingMessage) {
        let Some(outbound) = self.respond(msg).await else {
            debug!("Ignoring non-text message {} in chat {}", msg.message_id, msg.chat_id);
            return;
        };

        if let Err(e) = self.sink.deliver(msg, outbound).await {
            error!("Failed to deliver reply: {:#}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::{ContentError, Hadith, PageNumber};
    use crate::handlers::{
        FALLBACK_TEXT, HADITH_APOLOGY_TEXT, PAGE_RANGE_TEXT, WELCOME_TEXT,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Fetch {
        Hadith,
        Page(u16),
    }

    /// Records every fetch; hadith requests fail with a malformed payload.
    #[derive(Default)]
    pub struct RecordingContent {
        pub fetches: Mutex<Vec<Fetch>>,
    }

    #[async_trait]
    impl ContentSource for RecordingContent {
        async fn random_hadith(&self) -> Result<Hadith, ContentError> {
            self.fetches.lock().await.push(Fetch::Hadith);
            Err(ContentError::Malformed {
                url: "test://books/bukhari".to_string(),
                reason: "missing 'data.hadiths'".to_string(),
            })
        }

        async fn page_image(&self, page: PageNumber) -> Result<Vec<u8>, ContentError> {
            self.fetches.lock().await.push(Fetch::Page(page.get()));
            Ok(page.get().to_be_bytes().to_vec())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Text {
            chat_id: i64,
            text: String,
            reply_to: Option<i32>,
        },
        Image {
            chat_id: i64,
            image: Vec<u8>,
            caption: String,
        },
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<Sent>>,
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn send_text(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
            self.sent.lock().await.push(Sent::Text {
                chat_id,
                text: text.to_string(),
                reply_to,
            });
            Ok(())
        }

        async fn send_image(&self, chat_id: i64, image: Vec<u8>, caption: &str) -> Result<()> {
            self.sent.lock().await.push(Sent::Image {
                chat_id,
                image,
                caption: caption.to_string(),
            });
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ChatSink for FailingSink {
        async fn send_text(&self, _: i64, _: &str, _: Option<i32>) -> Result<()> {
            anyhow::bail!("chat not found")
        }

        async fn send_image(&self, _: i64, _: Vec<u8>, _: &str) -> Result<()> {
            anyhow::bail!("chat not found")
        }
    }

    pub fn text_message(text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: 42,
            user_id: Some(7),
            message_id: 99,
            text: Some(text.to_string()),
        }
    }

    fn context() -> (BotContext, Arc<RecordingContent>, Arc<RecordingSink>) {
        let content = Arc::new(RecordingContent::default());
        let sink = Arc::new(RecordingSink::default());
        (BotContext::new(content.clone(), sink.clone()), content, sink)
    }

    #[tokio::test]
    async fn test_start_sends_welcome_every_time() {
        let (ctx, content, sink) = context();
        ctx.handle(&text_message("/start")).await;
        ctx.handle(&text_message("/start")).await;

        let welcome = Sent::Text {
            chat_id: 42,
            text: WELCOME_TEXT.to_string(),
            reply_to: None,
        };
        assert_eq!(*sink.sent.lock().await, vec![welcome.clone(), welcome]);
        assert!(content.fetches.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_every_valid_page_fetches_once() {
        let (ctx, content, sink) = context();
        for n in 1..=604u16 {
            ctx.handle(&text_message(&n.to_string())).await;
        }

        let fetches = content.fetches.lock().await;
        assert_eq!(fetches.len(), 604);
        assert!(fetches
            .iter()
            .zip(1..=604u16)
            .all(|(fetch, n)| *fetch == Fetch::Page(n)));

        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 604);
        assert_eq!(
            sent[11],
            Sent::Image {
                chat_id: 42,
                image: 12u16.to_be_bytes().to_vec(),
                caption: "📖 صفحة رقم 12".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_out_of_range_pages_reply_without_fetch() {
        let (ctx, content, sink) = context();
        for text in ["0", "605", "1000000"] {
            ctx.handle(&text_message(text)).await;
        }

        assert!(content.fetches.lock().await.is_empty());
        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|s| *s
            == Sent::Text {
                chat_id: 42,
                text: PAGE_RANGE_TEXT.to_string(),
                reply_to: Some(99),
            }));
    }

    #[tokio::test]
    async fn test_non_digit_text_goes_to_fallback() {
        let (ctx, content, sink) = context();
        for text in ["-3", "12a", "hello", "/help"] {
            ctx.handle(&text_message(text)).await;
        }

        assert!(content.fetches.lock().await.is_empty());
        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|s| matches!(
            s,
            Sent::Text { text, reply_to: None, .. } if text == FALLBACK_TEXT
        )));
    }

    #[tokio::test]
    async fn test_hadith_failure_is_caught() {
        let (ctx, content, sink) = context();
        ctx.handle(&text_message("/hadith")).await;

        assert_eq!(*content.fetches.lock().await, vec![Fetch::Hadith]);
        assert_eq!(
            *sink.sent.lock().await,
            vec![Sent::Text {
                chat_id: 42,
                text: HADITH_APOLOGY_TEXT.to_string(),
                reply_to: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_same_page_twice_is_fetched_twice() {
        let (ctx, content, sink) = context();
        ctx.handle(&text_message("255")).await;
        ctx.handle(&text_message("255")).await;

        assert_eq!(
            *content.fetches.lock().await,
            vec![Fetch::Page(255), Fetch::Page(255)]
        );
        assert_eq!(sink.sent.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_non_text_message_is_ignored() {
        let (ctx, content, sink) = context();
        let msg = IncomingMessage {
            text: None,
            ..text_message("")
        };
        ctx.handle(&msg).await;

        assert!(content.fetches.lock().await.is_empty());
        assert!(sink.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_panic() {
        let ctx = BotContext::new(Arc::new(RecordingContent::default()), Arc::new(FailingSink));
        ctx.handle(&text_message("/start")).await;
    }
}
