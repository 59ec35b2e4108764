//! OpenAI-compatible chat-completion adapter (OpenRouter by default).
//!
//! Uses the `chat/completions` endpoint with a single user message and returns the
//! first choice's content.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use satya_core::{
    analysis::AnalysisRequest, config::Config, errors::Error, ports::AnalysisBackend, Result,
};

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        // No explicit timeout: the client's defaults apply.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.analysis_api_key.clone(), cfg.analysis_base_url.clone())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl AnalysisBackend for OpenAiClient {
    async fn complete(&self, req: &AnalysisRequest) -> Result<String> {
        let prompt = req.prompt();
        let body = ChatRequest {
            model: &req.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: req.temperature,
        };

        let resp = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Analysis(format!("request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Analysis(format!(
                "completion failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Analysis(format!("malformed response: {e}")))?;
        debug!(choices = parsed.choices.len(), "completion received");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Analysis("response contained no completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request(content: &str) -> AnalysisRequest {
        AnalysisRequest {
            content: content.to_string(),
            model: "deepseek/deepseek-r1:free".to_string(),
            temperature: 0.3,
        }
    }

    #[tokio::test]
    async fn posts_single_user_message_and_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let req = request("Vaccines cause magnetism");
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "deepseek/deepseek-r1:free",
                "messages": [{ "role": "user", "content": req.prompt() }],
                "temperature": 0.3
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"[Score: 82/100] ..."}},
                               {"message":{"role":"assistant","content":"second"}}]}"#,
            )
            .create_async()
            .await;

        let client = OpenAiClient::new("sk-test", format!("{}/api/v1/", server.url())).unwrap();
        let out = client.complete(&req).await.unwrap();
        assert_eq!(out, "[Score: 82/100] ...");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new("k", server.url()).unwrap();
        let err = client.complete(&request("x")).await.unwrap_err();
        let detail = err.detail();
        assert!(detail.contains("429"), "{detail}");
        assert!(detail.contains("rate limited"), "{detail}");
    }

    #[tokio::test]
    async fn empty_or_malformed_responses_are_errors() {
        let mut server = mockito::Server::new_async().await;
        let _empty = server
            .mock("POST", "/empty/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;
        let _garbage = server
            .mock("POST", "/garbage/chat/completions")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let empty = OpenAiClient::new("k", format!("{}/empty", server.url())).unwrap();
        assert!(matches!(
            empty.complete(&request("x")).await,
            Err(Error::Analysis(_))
        ));

        let garbage = OpenAiClient::new("k", format!("{}/garbage", server.url())).unwrap();
        let err = garbage.complete(&request("x")).await.unwrap_err();
        assert!(err.detail().starts_with("malformed response"));
    }
}
