use crate::types::SynthesisRequest;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
pub const DEFAULT_ENDPOINT_PATH: &str = "/v1/speak?model={model}";

#[derive(Serialize)]
struct SpeakBody<'a> {
    text: &'a str,
}

/// HTTP client for the speech-synthesis endpoint.
pub struct SpeechTransport {
    client: reqwest::Client,
    base_url: String,
    endpoint_path: String,
}

impl SpeechTransport {
    pub fn builder() -> SpeechTransportBuilder {
        SpeechTransportBuilder::new()
    }

    /// Endpoint for `model`, with the model substituted URL-encoded.
    pub fn endpoint_url(&self, model: &str) -> Result<Url> {
        let encoded: String = url::form_urlencoded::byte_serialize(model.as_bytes()).collect();
        let path = self.endpoint_path.replace("{model}", &encoded);
        let url = format!("{}{}", self.base_url, path);
        Url::parse(&url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid endpoint URL '{}': {}", url, e),
                ErrorContext::new()
                    .with_field_path("endpoint_path")
                    .with_source("transport"),
            )
        })
    }

    /// POST the text and return the audio body as a byte stream.
    ///
    /// A non-2xx status fails with [`Error::Http`] before any of the body is read.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<BoxStream<'static, Bytes>> {
        let url = self.endpoint_url(request.model())?;
        info!(model = request.model(), chars = request.text().len(), "requesting synthesis");

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Token {}", request.credential()))
            .json(&SpeakBody {
                text: request.text(),
            })
            .send()
            .await
            .map_err(|e| {
                Error::network_with_context(
                    format!("Synthesis request failed: {}", e),
                    e,
                    ErrorContext::new().with_source("transport"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            info!(http_status = status.as_u16(), "synthesis request rejected");
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }
        debug!(
            http_status = status.as_u16(),
            content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            "synthesis response headers received"
        );

        let byte_stream = response.bytes_stream().map_err(|e| {
            Error::network_with_context(
                format!("Failed to read synthesis response: {}", e),
                e,
                ErrorContext::new().with_source("transport"),
            )
        });
        Ok(Box::pin(byte_stream))
    }
}

pub struct SpeechTransportBuilder {
    base_url: Option<String>,
    endpoint_path: Option<String>,
    timeout: Option<Duration>,
}

impl SpeechTransportBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            endpoint_path: None,
            timeout: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Path template appended to the base URL; `{model}` is replaced per request.
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }

    /// Overall request timeout. Unset by default: a slow body is waited on indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SpeechTransport> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let parsed = Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL '{}': {}", base_url, e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("transport"),
            )
        })?;
        if parsed.cannot_be_a_base() {
            return Err(Error::configuration_with_context(
                format!("Base URL '{}' cannot carry a path", base_url),
                ErrorContext::new().with_field_path("base_url"),
            ));
        }
        let endpoint_path = self
            .endpoint_path
            .unwrap_or_else(|| DEFAULT_ENDPOINT_PATH.to_string());
        let endpoint_path = if endpoint_path.starts_with('/') {
            endpoint_path
        } else {
            format!("/{}", endpoint_path)
        };

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("speakstream/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(SpeechTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint_path,
        })
    }
}

impl Default for SpeechTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let transport = SpeechTransport::builder().build().unwrap();
        assert_eq!(
            transport.endpoint_url("aura-asteria-en").unwrap().as_str(),
            "https://api.deepgram.com/v1/speak?model=aura-asteria-en"
        );
    }

    #[test]
    fn test_model_is_url_encoded() {
        let transport = SpeechTransport::builder()
            .base_url("http://localhost:8080/")
            .endpoint_path("tts/{model}/speak")
            .build()
            .unwrap();
        assert_eq!(
            transport.endpoint_url("voice a&b").unwrap().as_str(),
            "http://localhost:8080/tts/voice+a%26b/speak"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = SpeechTransport::builder()
            .base_url("not a url")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), "config_error");
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("base_url")
        );
    }
}
