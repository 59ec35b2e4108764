use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

pub const DEFAULT_ANALYSIS_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_ANALYSIS_MODEL: &str = "deepseek/deepseek-r1:free";
pub const DEFAULT_ANALYSIS_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 3000;
pub const DEFAULT_MAX_CONCURRENT_ANALYSES: usize = 8;
pub const DEFAULT_TELEGRAM_SAFE_LIMIT: usize = 4000;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const REDACTED: &str = "<redacted>";

/// Typed configuration, built once at startup and shared as `Arc<Config>`.
#[derive(Clone)]
pub struct Config {
    // Secrets
    pub telegram_bot_token: String,
    pub analysis_api_key: String,

    // Analysis endpoint
    pub analysis_base_url: String,
    pub analysis_model: String,
    pub analysis_temperature: f32,
    pub max_content_chars: usize,
    pub max_concurrent_analyses: usize,

    // OCR
    pub tesseract_path: PathBuf,
    pub ocr_language: String,

    // Runtime
    pub temp_dir: PathBuf,
    pub telegram_safe_limit: usize,
    pub article_user_agent: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &REDACTED)
            .field("analysis_api_key", &REDACTED)
            .field("analysis_base_url", &self.analysis_base_url)
            .field("analysis_model", &self.analysis_model)
            .field("analysis_temperature", &self.analysis_temperature)
            .field("max_content_chars", &self.max_content_chars)
            .field("max_concurrent_analyses", &self.max_concurrent_analyses)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_language", &self.ocr_language)
            .field("temp_dir", &self.temp_dir)
            .field("telegram_safe_limit", &self.telegram_safe_limit)
            .field("article_user_agent", &self.article_user_agent)
            .finish()
    }
}

impl Config {
    /// Load from the process environment, overlaid on an optional `.env`, and make sure
    /// the temp directory exists.
    pub fn load() -> Result<Self> {
        // Existing environment always wins over `.env`.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("failed to read .env: {e}")));
            }
        }

        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        fs::create_dir_all(&cfg.temp_dir)?;
        Ok(cfg)
    }

    /// Build a config from `get`, which maps a variable name to its raw value.
    ///
    /// Blank values count as unset. Unparseable numbers fall back to their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let str_var = |key: &str| get(key).and_then(non_empty);
        let usize_var = |key: &str| str_var(key).and_then(|s| s.trim().parse::<usize>().ok());

        let Some(telegram_bot_token) = str_var("TELEGRAM_BOT_TOKEN") else {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        };
        let Some(analysis_api_key) = str_var("OPENROUTER_API_KEY") else {
            return Err(Error::Config(
                "OPENROUTER_API_KEY environment variable is required".to_string(),
            ));
        };

        let analysis_base_url = str_var("ANALYSIS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_ANALYSIS_BASE_URL.to_string());
        let analysis_model =
            str_var("ANALYSIS_MODEL").unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string());
        let analysis_temperature = str_var("ANALYSIS_TEMPERATURE")
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(DEFAULT_ANALYSIS_TEMPERATURE);
        let max_content_chars = usize_var("MAX_CONTENT_CHARS")
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONTENT_CHARS);
        let max_concurrent_analyses = usize_var("MAX_CONCURRENT_ANALYSES")
            .unwrap_or(DEFAULT_MAX_CONCURRENT_ANALYSES)
            .max(1);

        let tesseract_path = str_var("TESSERACT_PATH")
            .map(PathBuf::from)
            .or_else(|| which_in_path("tesseract"))
            .unwrap_or_else(|| PathBuf::from("/usr/bin/tesseract"));
        let ocr_language = str_var("OCR_LANGUAGE").unwrap_or_else(|| "eng".to_string());

        let temp_dir = str_var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("satya-bot"));

        let telegram_safe_limit = usize_var("TELEGRAM_SAFE_LIMIT")
            .unwrap_or(DEFAULT_TELEGRAM_SAFE_LIMIT)
            .max(200);
        let article_user_agent =
            str_var("ARTICLE_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            telegram_bot_token,
            analysis_api_key,
            analysis_base_url,
            analysis_model,
            analysis_temperature,
            max_content_chars,
            max_concurrent_analyses,
            tesseract_path,
            ocr_language,
            temp_dir,
            telegram_safe_limit,
            article_user_agent,
        })
    }
}

fn which_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable_file(candidate))
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
