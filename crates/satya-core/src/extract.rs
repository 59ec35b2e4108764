//! Content extractors: normalize a message payload into plain analyzable text.

use std::path::Path;

use tracing::{debug, warn};

use crate::{
    errors::Error,
    messaging::types::{largest_photo, PhotoRef},
    ports::{ArticleSource, PhotoSource, TextRecognizer},
    Result,
};

/// Plain text handed to the analysis client. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedContent(String);

impl ExtractedContent {
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.is_empty()).then_some(Self(text))
    }

    /// Placeholder content used when an article could not be extracted. It still goes
    /// through analysis.
    pub fn from_article_failure(err: &Error) -> Self {
        Self(format!("Error extracting article: {}", err.detail()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pass-through extractor for plain text. Returns the input unchanged.
pub fn extract_text(text: &str) -> Option<ExtractedContent> {
    ExtractedContent::new(text)
}

/// Download and parse the article at `url` into `"{title}\n\n{body}"`.
pub async fn extract_url(source: &dyn ArticleSource, url: &str) -> Result<ExtractedContent> {
    let article = source.fetch_article(url).await?;
    debug!(
        url,
        title_chars = article.title.chars().count(),
        body_chars = article.text.chars().count(),
        "article extracted"
    );
    ExtractedContent::new(article.into_content())
        .ok_or_else(|| Error::Article(format!("no content extracted from {url}")))
}

/// Terminal outcomes of the image extractor.
#[derive(Debug, thiserror::Error)]
pub enum ImageExtractError {
    #[error("no text found in image")]
    NoText,

    #[error(transparent)]
    Failed(#[from] Error),
}

/// Download the largest variant of a photo to scoped temporary storage and OCR it.
///
/// The temporary file is removed on every exit path.
pub async fn extract_image(
    photos: &dyn PhotoSource,
    ocr: &dyn TextRecognizer,
    temp_dir: &Path,
    variants: &[PhotoRef],
) -> std::result::Result<ExtractedContent, ImageExtractError> {
    let photo = largest_photo(variants)
        .ok_or_else(|| Error::External("photo message has no sizes".to_string()))?;

    let tmp = tempfile::Builder::new()
        .prefix("photo_")
        .suffix(".jpg")
        .tempfile_in(temp_dir)
        .map_err(Error::Io)?;

    photos.download(photo, tmp.path()).await?;
    let text = ocr.recognize(tmp.path()).await?;

    if let Err(e) = tmp.close() {
        warn!("failed to remove temporary photo: {e}");
    }

    if text.trim().is_empty() {
        return Err(ImageExtractError::NoText);
    }
    debug!(chars = text.chars().count(), "ocr text extracted");

    ExtractedContent::new(text).ok_or(ImageExtractError::NoText)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_extractor_is_identity() {
        for s in ["Vaccines cause magnetism", "  padded  ", "multi\nline\n", "emoji 🔍"] {
            assert_eq!(extract_text(s).as_ref().map(ExtractedContent::as_str), Some(s));
        }
        assert!(extract_text("").is_none());
    }

    #[test]
    fn article_failure_content_describes_error() {
        let c = ExtractedContent::from_article_failure(&Error::Article("HTTP 404".to_string()));
        assert_eq!(c.as_str(), "Error extracting article: HTTP 404");
    }
}
