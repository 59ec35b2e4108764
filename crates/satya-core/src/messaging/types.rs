/// Inbound message, reduced to the shapes the bot knows how to analyze.
///
/// Produced once per user turn by the transport adapter and consumed exactly once by
/// [`crate::pipeline::Pipeline::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncomingMessage {
    PlainText(String),
    UrlText(UrlMessage),
    Photo(Vec<PhotoRef>),
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlMessage {
    /// Full message text.
    pub text: String,
    /// Substring annotated by the first `url` entity.
    pub url: String,
}

/// One resolution variant of a Telegram photo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoRef {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoRef {
    fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Pick the largest-resolution variant. Ties go to the later entry, which is what
/// Telegram sorts last.
pub fn largest_photo(photos: &[PhotoRef]) -> Option<&PhotoRef> {
    photos.iter().max_by_key(|p| p.area())
}

impl IncomingMessage {
    /// Classify a raw transport message.
    ///
    /// Precedence: URL entity, then non-empty text, then photo attachment.
    pub fn classify(text: Option<&str>, first_url: Option<&str>, photos: Vec<PhotoRef>) -> Self {
        if let Some(text) = text {
            if let Some(url) = first_url {
                return Self::UrlText(UrlMessage {
                    text: text.to_string(),
                    url: url.to_string(),
                });
            }
            if !text.is_empty() {
                return Self::PlainText(text.to_string());
            }
        }
        if !photos.is_empty() {
            return Self::Photo(photos);
        }
        Self::Unsupported
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlainText(_) => "text",
            Self::UrlText(_) => "url",
            Self::Photo(_) => "photo",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Outgoing "chat action" (typing indicator, etc).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}
