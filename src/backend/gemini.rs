//! Backend for the Google Gemini API.
//!
//! [`GeminiBackend`] opens `models/{model}:streamGenerateContent?alt=sse`
//! and decodes the SSE body with [`GeminiSseDecoder`]. The API key travels
//! in the `x-goog-api-key` header rather than the query string so it never
//! shows up in logged URLs.

use super::sse::GeminiSseDecoder;
use super::{status_error, Backend, LlmRequest};
use crate::error::Result;
use crate::streaming::{decode_byte_stream, TextStream};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

/// Default public endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Streaming backend for Gemini `generateContent` models.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    api_version: String,
}

impl GeminiBackend {
    /// Create a backend targeting the `v1beta` API.
    pub fn new() -> Self {
        Self {
            api_version: "v1beta".to_string(),
        }
    }

    /// Target a different API version (e.g. `"v1"`).
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn stream_url(&self, base_url: &str, model: &str) -> String {
        format!(
            "{}/{}/models/{}:streamGenerateContent?alt=sse",
            base_url.trim_end_matches('/'),
            self.api_version,
            model
        )
    }

    /// Build the `GenerateContentRequest` body.
    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
        });

        if let Some(ref sys) = request.system_prompt {
            if !sys.is_empty() {
                body["system_instruction"] = json!({ "parts": [{ "text": sys }] });
            }
        }

        let mut gen_config = serde_json::Map::new();
        if let Some(t) = request.config.temperature {
            gen_config.insert("temperature".into(), json!(t));
        }
        if let Some(n) = request.config.max_output_tokens {
            gen_config.insert("maxOutputTokens".into(), json!(n));
        }
        if !gen_config.is_empty() {
            body["generationConfig"] = Value::Object(gen_config);
        }

        body
    }
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the human-readable message out of a Gemini error body.
///
/// Gemini returns `{"error": {"code", "message", "status"}}`; anything
/// else is passed through as-is.
pub(crate) fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let err = v.get("error")?;
            err.get("message")
                .or(Some(err))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn open_stream(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<TextStream> {
        let url = self.stream_url(base_url, &request.model);
        debug!(url = %url, "opening gemini stream");

        let resp = client
            .post(&url)
            .header("x-goog-api-key", &request.credential)
            .json(&Self::build_body(request))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        Ok(decode_byte_stream(resp.bytes_stream(), GeminiSseDecoder::new()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::error::BlogflowError;
    use crate::streaming::consume_stream;
    use mockito::Matcher;

    fn request(model: &str) -> LlmRequest {
        LlmRequest {
            model: model.into(),
            system_prompt: Some("You are an expert blog post writer.".into()),
            prompt: "Write about Rust".into(),
            credential: "test-key".into(),
            config: LlmConfig::default(),
        }
    }

    fn sse_event(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
        )
    }

    #[test]
    fn test_build_body_with_system_and_config() {
        let mut req = request("gemini-1.5-flash");
        req.config = LlmConfig::default()
            .with_temperature(0.4)
            .with_max_output_tokens(512);
        let body = GeminiBackend::build_body(&req);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Write about Rust");
        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            "You are an expert blog post writer."
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.4);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn test_build_body_minimal() {
        let mut req = request("m");
        req.system_prompt = None;
        let body = GeminiBackend::build_body(&req);
        assert!(body.get("system_instruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_stream_url() {
        let backend = GeminiBackend::new();
        assert_eq!(
            backend.stream_url("https://example.test/", "gemini-1.5-pro"),
            "https://example.test/v1beta/models/gemini-1.5-pro:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_provider_error_message() {
        let body = r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(provider_error_message(body), "quota exceeded");
        assert_eq!(provider_error_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_open_stream_decodes_sse() {
        let mut server = mockito::Server::new_async().await;
        let body = format!("{}{}", sse_event("<h1>"), sse_event("Hi</h1>"));
        let mock = server
            .mock("POST", Matcher::Regex("gemini-1.5-flash:streamGenerateContent".into()))
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let stream = GeminiBackend::new()
            .open_stream(&Client::new(), &server.url(), &request("gemini-1.5-flash"))
            .await
            .unwrap();
        let text = consume_stream(stream, &mut |_| {}).await.unwrap();

        assert_eq!(text, "<h1>Hi</h1>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_stream_http_error_before_first_byte() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex("streamGenerateContent".into()))
            .with_status(429)
            .with_header("retry-after", "7")
            .with_body(r#"{"error":{"code":429,"message":"quota exceeded"}}"#)
            .create_async()
            .await;

        let err = GeminiBackend::new()
            .open_stream(&Client::new(), &server.url(), &request("gemini-1.5-flash"))
            .await
            .err()
            .unwrap();

        match err {
            BlogflowError::HttpError {
                status,
                body,
                retry_after,
            } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(7)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
