//! Telegram adapter (teloxide).
//!
//! Implements the `satya-core` MessagingPort and PhotoSource over the Telegram Bot API.

use std::path::Path;

use async_trait::async_trait;
use teloxide::{net::Download, prelude::*, types::ParseMode, RequestError};
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub mod handlers;
pub mod router;

use satya_core::{
    domain::ChatId,
    errors::Error,
    formatting::markdown_to_telegram_html,
    messaging::{
        port::MessagingPort,
        split::split_message,
        types::{ChatAction, PhotoRef},
    },
    ports::PhotoSource,
    Result,
};

const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    safe_limit: usize,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, safe_limit: usize) -> Self {
        Self {
            bot,
            safe_limit: safe_limit.min(TELEGRAM_MESSAGE_LIMIT),
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }
}

fn map_err(e: RequestError) -> Error {
    Error::External(format!("telegram error: {e}"))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn send_markdown(&self, chat_id: ChatId, markdown: &str) -> Result<()> {
        for chunk in split_message(markdown, self.safe_limit) {
            let html = markdown_to_telegram_html(&chunk);
            let result = self
                .bot
                .send_message(Self::tg_chat(chat_id), html)
                .parse_mode(ParseMode::Html)
                .await;

            match result {
                Ok(_) => {}
                // Markup rejected: fall back to plain text for this chunk.
                Err(RequestError::Api(e)) => {
                    warn!(
                        chat_id = chat_id.0,
                        "telegram rejected html reply ({e}); sending plain text"
                    );
                    self.bot
                        .send_message(Self::tg_chat(chat_id), chunk)
                        .await
                        .map_err(map_err)?;
                }
                Err(e) => return Err(map_err(e)),
            }
        }
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
        };
        self.bot
            .send_chat_action(Self::tg_chat(chat_id), tg_action)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

/// Downloads photo attachments through the Bot API file endpoint.
#[derive(Clone)]
pub struct TelegramPhotos {
    bot: Bot,
}

impl TelegramPhotos {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl PhotoSource for TelegramPhotos {
    async fn download(&self, photo: &PhotoRef, dst: &Path) -> Result<()> {
        let file = self
            .bot
            .get_file(photo.file_id.clone())
            .await
            .map_err(map_err)?;

        let mut out = tokio::fs::File::create(dst).await?;
        self.bot
            .download_file(&file.path, &mut out)
            .await
            .map_err(|e| Error::External(format!("telegram download error: {e}")))?;
        out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn sent_message(text: &str) -> String {
        json!({
            "ok": true,
            "result": {
                "message_id": 1,
                "date": 1_700_000_000,
                "chat": { "id": 42, "type": "private", "first_name": "Test" },
                "text": text
            }
        })
        .to_string()
    }

    fn messenger(server: &Server) -> TelegramMessenger {
        let bot = Bot::new("123:test").set_api_url(server.url().parse().unwrap());
        TelegramMessenger::new(bot, 4000)
    }

    fn send_message_path() -> Matcher {
        Matcher::Regex(r"(?i)/bot123:test/sendmessage$".to_string())
    }

    #[tokio::test]
    async fn html_reply_is_sent_once() {
        let mut server = Server::new_async().await;
        let html = server
            .mock("POST", send_message_path())
            .match_body(Matcher::PartialJson(json!({
                "chat_id": 42,
                "text": "<b>Bold</b> claim",
                "parse_mode": "HTML"
            })))
            .with_body(sent_message("Bold claim"))
            .expect(1)
            .create_async()
            .await;

        messenger(&server)
            .send_markdown(ChatId(42), "**Bold** claim")
            .await
            .unwrap();
        html.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_html_falls_back_to_plain_text() {
        let mut server = Server::new_async().await;
        let html = server
            .mock("POST", send_message_path())
            .match_body(Matcher::PartialJson(json!({ "text": "<b>Bold</b> claim" })))
            .with_status(400)
            .with_body(
                json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: can't parse entities: unexpected end tag"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let plain = server
            .mock("POST", send_message_path())
            .match_body(Matcher::PartialJson(json!({ "text": "**Bold** claim" })))
            .with_body(sent_message("**Bold** claim"))
            .expect(1)
            .create_async()
            .await;

        messenger(&server)
            .send_markdown(ChatId(42), "**Bold** claim")
            .await
            .unwrap();
        html.assert_async().await;
        plain.assert_async().await;
    }
}
