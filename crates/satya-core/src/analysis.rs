//! Analysis client: fixed fact-check prompt over a remote chat-completion backend.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{config::Config, extract::ExtractedContent, ports::AnalysisBackend, Result};

const PROMPT_HEADER: &str = "Analyze this news content and provide:
1. Fake News Score (0-100) as [Score: X/100]
2. Brief fact-check summary
3. Potential red flags
4. Suggested verification sources";

/// One request to the remote model. Built fresh per call.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisRequest {
    /// Extracted content, already truncated.
    pub content: String,
    pub model: String,
    pub temperature: f32,
}

impl AnalysisRequest {
    /// The single user message sent to the model.
    pub fn prompt(&self) -> String {
        format!("{PROMPT_HEADER}\n\nContent: {}", self.content)
    }
}

/// First `max_chars` characters of `text` (character, not byte, boundary).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Clone)]
pub struct AnalysisClient {
    backend: Arc<dyn AnalysisBackend>,
    model: String,
    temperature: f32,
    max_content_chars: usize,
}

impl AnalysisClient {
    pub fn new(backend: Arc<dyn AnalysisBackend>, cfg: &Config) -> Self {
        Self {
            backend,
            model: cfg.analysis_model.clone(),
            temperature: cfg.analysis_temperature,
            max_content_chars: cfg.max_content_chars,
        }
    }

    pub fn build_request(&self, content: &ExtractedContent) -> AnalysisRequest {
        AnalysisRequest {
            content: truncate_chars(content.as_str(), self.max_content_chars).to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }

    /// Run the analysis and return the model's raw text.
    pub async fn analyze(&self, content: &ExtractedContent) -> Result<String> {
        let req = self.build_request(content);
        info!(
            model = %req.model,
            chars = req.content.chars().count(),
            "submitting content for analysis"
        );

        self.backend.complete(&req).await.map_err(|e| {
            warn!("analysis request failed: {e}");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn prompt_embeds_content_after_fixed_sections() {
        let req = AnalysisRequest {
            content: "Vaccines cause magnetism".to_string(),
            model: "m".to_string(),
            temperature: 0.3,
        };
        let prompt = req.prompt();
        assert!(prompt.starts_with("Analyze this news content and provide:\n"));
        assert!(prompt.contains("1. Fake News Score (0-100) as [Score: X/100]"));
        assert!(prompt.contains("4. Suggested verification sources"));
        assert!(prompt.ends_with("\n\nContent: Vaccines cause magnetism"));
    }
}
