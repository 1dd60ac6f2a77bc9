/// HTTP client for the external compression service.
///
/// Talks to the service at `localhost:8000` (configurable) using the
/// synchronous `ureq` client. Two endpoints are used:
///
/// - `GET /health`: liveness and backend capability snapshot.
/// - `POST /compress`: compress a single prompt.
///
/// Any non-2xx status is a failure, as is an undecodable body. No retries
/// are attempted, and no deadline is applied unless one is configured.
use std::time::Duration;

use thiserror::Error;

use super::types::{CompressionRequest, CompressionResponse, HealthResponse};
use crate::config::schema::ServiceConfig;

/// Failure talking to the compression service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The host was unreachable or the connection broke.
    #[error("could not reach compression service: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("HTTP error! status: {0}")]
    Status(u16),
    /// The response body was not the expected JSON.
    #[error("malformed response from compression service: {0}")]
    Decode(String),
}

/// The two calls the injector and popup need from the service.
///
/// Implemented by [`HttpCompressionClient`] for real use; tests substitute
/// scripted implementations.
pub trait CompressionService {
    fn health(&self) -> Result<HealthResponse, ServiceError>;
    fn compress(&self, request: &CompressionRequest) -> Result<CompressionResponse, ServiceError>;
}

impl<S: CompressionService + ?Sized> CompressionService for &S {
    fn health(&self) -> Result<HealthResponse, ServiceError> {
        (**self).health()
    }

    fn compress(&self, request: &CompressionRequest) -> Result<CompressionResponse, ServiceError> {
        (**self).compress(request)
    }
}

/// Synchronous `ureq`-backed client.
#[derive(Debug, Clone)]
pub struct HttpCompressionClient {
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpCompressionClient {
    /// Build a client for the given base URL with no request deadline.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            timeout: None,
        }
    }

    /// Build a client from the resolved `[service]` config.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            base_url: normalize_base_url(&config.base_url),
            timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }

    /// Apply a per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return the base URL for display.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_timeout(&self, request: ureq::Request) -> ureq::Request {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

impl CompressionService for HttpCompressionClient {
    fn health(&self) -> Result<HealthResponse, ServiceError> {
        let request = self.apply_timeout(ureq::get(&self.endpoint("/health")));
        let response = request.call().map_err(map_ureq_error)?;
        response
            .into_json::<HealthResponse>()
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    fn compress(&self, request: &CompressionRequest) -> Result<CompressionResponse, ServiceError> {
        let http = self.apply_timeout(
            ureq::post(&self.endpoint("/compress")).set("Content-Type", "application/json"),
        );
        let response = http.send_json(request).map_err(map_ureq_error)?;
        response
            .into_json::<CompressionResponse>()
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

fn map_ureq_error(err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(code, _) => ServiceError::Status(code),
        ureq::Error::Transport(t) => ServiceError::Transport(t.to_string()),
    }
}

/// Strip trailing slashes and pin `localhost` to IPv4.
///
/// Resolving `localhost` may try `::1` first, which stalls when the service
/// only binds to IPv4.
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/')
        .replace("://localhost", "://127.0.0.1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let config = ServiceConfig::default();
        let client = HttpCompressionClient::from_config(&config);
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert!(client.timeout.is_none());
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = HttpCompressionClient::new("http://compress.internal:9000/");
        assert_eq!(client.base_url(), "http://compress.internal:9000");
        assert_eq!(
            client.endpoint("/compress"),
            "http://compress.internal:9000/compress"
        );
    }

    #[test]
    fn configured_timeout_is_applied() {
        let config = ServiceConfig {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: Some(2500),
        };
        let client = HttpCompressionClient::from_config(&config);
        assert_eq!(client.timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn status_error_mentions_code() {
        let err = ServiceError::Status(503);
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }
}
