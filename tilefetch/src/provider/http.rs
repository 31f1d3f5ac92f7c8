//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;

/// Default user agent sent with every request.
pub const USER_AGENT: &str = concat!("tilefetch/", env!("CARGO_PKG_VERSION"));

/// Errors below the HTTP status layer: the request never produced a
/// complete response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response (or no further body bytes) within the allowed time.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending the request.
    #[error("request failed: {0}")]
    Request(String),

    /// The connection broke while the body was being read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Response status plus a body that has not been read yet.
///
/// The body is a stream of chunks so that large tiles can be written to disk
/// without buffering them whole.
pub struct HttpResponse {
    status: u16,
    body: BoxStream<'static, Result<Bytes, TransportError>>,
}

impl HttpResponse {
    pub fn new(status: u16, body: BoxStream<'static, Result<Bytes, TransportError>>) -> Self {
        Self { status, body }
    }

    /// Response whose body is already in memory.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        let chunks: Vec<Result<Bytes, TransportError>> = if body.is_empty() {
            vec![]
        } else {
            vec![Ok(body)]
        };
        Self::new(status, stream::iter(chunks).boxed())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Takes the body stream, consuming the response.
    pub fn into_body(self) -> BoxStream<'static, Result<Bytes, TransportError>> {
        self.body
    }

    /// Reads the whole body into memory.
    pub async fn into_bytes(self) -> Result<Vec<u8>, TransportError> {
        let mut body = self.body;
        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests. Non-2xx statuses are returned as
/// responses, not errors; callers decide how to classify them.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Real HTTP client implementation using reqwest.
///
/// The underlying client pools connections, so one instance should be shared
/// by every concurrent download.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a new ReqwestClient with a connect timeout.
    ///
    /// Whole-request deadlines are applied by the caller, so only connection
    /// setup is bounded here.
    pub fn with_timeout(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(HttpResponse::new(status, body))
    }
}
