//! Hexagonal ports for the external collaborators of the pipeline.

use std::path::Path;

use async_trait::async_trait;

use crate::{analysis::AnalysisRequest, article::Article, messaging::types::PhotoRef, Result};

/// Remote chat-completion endpoint.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit one single-turn request and return the first choice's message content.
    async fn complete(&self, req: &AnalysisRequest) -> Result<String>;
}

/// Fetches a web page and extracts the article on it.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_article(&self, url: &str) -> Result<Article>;
}

/// OCR engine.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String>;
}

/// Downloads a photo attachment from the transport.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Write the photo's bytes to `dst`, which already exists and is owned by the caller.
    async fn download(&self, photo: &PhotoRef, dst: &Path) -> Result<()>;
}
