//! Backend for a relay endpoint that re-frames provider output.
//!
//! When the provider call runs behind an HTTP hop, the relay answers with a
//! `0:"…"` line-framed body (see [`crate::framing`]). [`RelayBackend`]
//! posts the request as JSON and decodes that framing.

use super::{status_error, Backend, LlmRequest};
use crate::error::Result;
use crate::framing::decode_framed;
use crate::streaming::TextStream;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Body posted to the relay.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    prompt: &'a str,
    api_key: &'a str,
}

/// Backend that talks to a framing relay at `{base_url}{path}`.
///
/// # Example
///
/// ```
/// use blogflow::backend::RelayBackend;
///
/// let relay = RelayBackend::new("/api/generate");
/// ```
#[derive(Debug, Clone)]
pub struct RelayBackend {
    path: String,
}

impl RelayBackend {
    /// Create a relay backend posting to `path` on the context's base URL.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self { path }
    }
}

impl Default for RelayBackend {
    fn default() -> Self {
        Self::new("/api/generate")
    }
}

#[async_trait]
impl Backend for RelayBackend {
    async fn open_stream(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<TextStream> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        let body = RelayBody {
            model: &request.model,
            system: request.system_prompt.as_deref(),
            prompt: &request.prompt,
            api_key: &request.credential,
        };

        let resp = client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        Ok(decode_framed(resp.bytes_stream()))
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::framing::encode_text_part;
    use crate::streaming::consume_stream;
    use mockito::Matcher;

    fn request() -> LlmRequest {
        LlmRequest {
            model: "gemini-1.5-flash".into(),
            system_prompt: Some("sys".into()),
            prompt: "Write a post".into(),
            credential: "key-123".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_path_normalized() {
        assert_eq!(RelayBackend::new("api/social").path, "/api/social");
        assert_eq!(RelayBackend::default().path, "/api/generate");
    }

    #[tokio::test]
    async fn test_relay_decodes_framed_body() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "{}{}{}",
            encode_text_part("<h1>"),
            "e:{\"finishReason\":\"stop\"}\n",
            encode_text_part("Hi</h1>")
        );
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gemini-1.5-flash",
                "prompt": "Write a post",
                "apiKey": "key-123",
            })))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let stream = RelayBackend::default()
            .open_stream(&Client::new(), &server.url(), &request())
            .await
            .unwrap();
        let text = consume_stream(stream, &mut |_| {}).await.unwrap();

        assert_eq!(text, "<h1>Hi</h1>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_relay_error_body_extracted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body(r#"{"error":"All model fallbacks failed"}"#)
            .create_async()
            .await;

        let err = RelayBackend::default()
            .open_stream(&Client::new(), &server.url(), &request())
            .await
            .err()
            .unwrap();
        assert_eq!(err.message(), "All model fallbacks failed");
    }

    #[tokio::test]
    async fn test_relay_empty_error_body_uses_status_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(400)
            .create_async()
            .await;

        let err = RelayBackend::default()
            .open_stream(&Client::new(), &server.url(), &request())
            .await
            .err()
            .unwrap();
        assert_eq!(err.message(), "Bad Request");
    }
}
