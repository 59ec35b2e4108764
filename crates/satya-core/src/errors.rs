/// Core error type.
///
/// Adapter crates map their specific errors into this type so the pipeline can
/// decide per message whether a failure is terminal or forwarded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("article error: {0}")]
    Article(String),

    #[error("ocr error: {0}")]
    Ocr(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The failure description without the category prefix, for user-facing text.
    pub fn detail(&self) -> String {
        match self {
            Error::Config(s)
            | Error::Article(s)
            | Error::Ocr(s)
            | Error::Analysis(s)
            | Error::External(s) => s.clone(),
            Error::Io(e) => e.to_string(),
        }
    }
}
