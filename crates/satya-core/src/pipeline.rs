//! Message router: one incoming message → one extractor → analysis → formatted reply.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    analysis::AnalysisClient,
    config::Config,
    domain::ChatId,
    extract::{extract_image, extract_text, extract_url, ExtractedContent, ImageExtractError},
    formatting::{analysis_failure_text, format_reply},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, IncomingMessage, PhotoRef, UrlMessage},
    },
    ports::{AnalysisBackend, ArticleSource, PhotoSource, TextRecognizer},
    Result,
};

pub const TEXT_STATUS: &str = "📝 Analyzing provided text...";
pub const IMAGE_STATUS: &str = "🖼 Processing image...";
pub const NO_TEXT_IN_IMAGE: &str = "❌ No text found in image";
pub const IMAGE_FAILURE: &str = "❌ Error processing image";

pub fn url_status(url: &str) -> String {
    format!("🔍 Analyzing article at {url}...")
}

/// How a dispatched message ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An analysis reply (possibly wrapping an analysis error) was sent.
    Replied,
    /// Extraction failed terminally; the user got an error message instead of an analysis.
    Halted,
    /// No handler matches the message shape. Nothing was sent.
    Ignored,
}

#[derive(Clone)]
pub struct Pipeline {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    articles: Arc<dyn ArticleSource>,
    photos: Arc<dyn PhotoSource>,
    ocr: Arc<dyn TextRecognizer>,
    analysis: AnalysisClient,
}

impl Pipeline {
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        articles: Arc<dyn ArticleSource>,
        photos: Arc<dyn PhotoSource>,
        ocr: Arc<dyn TextRecognizer>,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        let analysis = AnalysisClient::new(backend, &cfg);
        Self {
            cfg,
            messenger,
            articles,
            photos,
            ocr,
            analysis,
        }
    }

    /// Route `msg` to exactly one extractor and reply in `chat_id`.
    ///
    /// Extraction and analysis failures are turned into replies here. The only errors
    /// returned are failures to deliver the final reply.
    pub async fn dispatch(&self, chat_id: ChatId, msg: IncomingMessage) -> Result<Outcome> {
        info!(chat_id = chat_id.0, kind = msg.kind(), "dispatching message");

        match msg {
            IncomingMessage::PlainText(text) => self.handle_text(chat_id, &text).await,
            IncomingMessage::UrlText(m) => self.handle_url(chat_id, &m).await,
            IncomingMessage::Photo(variants) => self.handle_image(chat_id, &variants).await,
            IncomingMessage::Unsupported => {
                debug!(chat_id = chat_id.0, "no handler for message shape");
                Ok(Outcome::Ignored)
            }
        }
    }

    async fn handle_text(&self, chat_id: ChatId, text: &str) -> Result<Outcome> {
        let Some(content) = extract_text(text) else {
            return Ok(Outcome::Ignored);
        };
        self.status(chat_id, TEXT_STATUS).await;
        self.analyze_and_reply(chat_id, content).await
    }

    async fn handle_url(&self, chat_id: ChatId, m: &UrlMessage) -> Result<Outcome> {
        debug!(
            chat_id = chat_id.0,
            url = %m.url,
            text_chars = m.text.chars().count(),
            "analyzing linked article"
        );
        self.status(chat_id, &url_status(&m.url)).await;

        // Extraction failures are analyzed as if they were the article.
        let content = match extract_url(self.articles.as_ref(), &m.url).await {
            Ok(c) => c,
            Err(e) => {
                error!(url = %m.url, "article parsing failed: {e}");
                ExtractedContent::from_article_failure(&e)
            }
        };
        self.analyze_and_reply(chat_id, content).await
    }

    async fn handle_image(&self, chat_id: ChatId, variants: &[PhotoRef]) -> Result<Outcome> {
        self.status(chat_id, IMAGE_STATUS).await;

        let extracted = extract_image(
            self.photos.as_ref(),
            self.ocr.as_ref(),
            &self.cfg.temp_dir,
            variants,
        )
        .await;

        match extracted {
            Ok(content) => self.analyze_and_reply(chat_id, content).await,
            Err(ImageExtractError::NoText) => {
                info!(chat_id = chat_id.0, "no text found in image");
                self.messenger.send_text(chat_id, NO_TEXT_IN_IMAGE).await?;
                Ok(Outcome::Halted)
            }
            Err(ImageExtractError::Failed(e)) => {
                error!(chat_id = chat_id.0, "image processing failed: {e}");
                self.messenger.send_text(chat_id, IMAGE_FAILURE).await?;
                Ok(Outcome::Halted)
            }
        }
    }

    async fn analyze_and_reply(
        &self,
        chat_id: ChatId,
        content: ExtractedContent,
    ) -> Result<Outcome> {
        if let Err(e) = self
            .messenger
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
        {
            debug!("typing indicator failed: {e}");
        }

        let body = match self.analysis.analyze(&content).await {
            Ok(text) => text,
            Err(e) => analysis_failure_text(&e),
        };
        let reply = format_reply(&body);

        self.messenger.send_markdown(chat_id, &reply).await?;
        Ok(Outcome::Replied)
    }

    /// Best-effort progress message.
    async fn status(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            warn!(chat_id = chat_id.0, "failed to send status message: {e}");
        }
    }
}
