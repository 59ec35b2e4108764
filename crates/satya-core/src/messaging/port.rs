use async_trait::async_trait;

use crate::{
    domain::ChatId,
    messaging::types::ChatAction,
    Result,
};

/// Cross-messenger port for outbound replies.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send text verbatim (no markup interpretation).
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Send a Markdown-formatted reply. Implementations render it in whatever markup the
    /// transport understands and may split it into several messages.
    async fn send_markdown(&self, chat_id: ChatId, markdown: &str) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
