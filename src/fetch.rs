//! Bounded conditional HTTP fetch primitive
//!
//! Adapters never touch reqwest directly; they go through the
//! `HttpFetch` trait so tests can inject canned responses. The
//! production implementation aborts the request at the deadline rather
//! than racing a timer, so sockets are freed when a source stalls.

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Outcome of a bounded GET
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response with body
    Ok {
        status: u16,
        etag: Option<String>,
        body: String,
    },
    /// 304 Not Modified; `etag` echoes the response header if present
    NotModified { etag: Option<String> },
}

/// Fetch failure, with timeout kept distinct from other transport errors
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Injectable HTTP-fetch seam
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// GET `url` with an optional `If-None-Match` etag, aborting at
    /// `timeout`
    async fn get(
        &self,
        url: &str,
        etag: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchOutcome, FetchError>;
}

/// Production fetch implementation backed by a shared reqwest client
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("market-pulse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(
        &self,
        url: &str,
        etag: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchOutcome, FetchError> {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let response_etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified {
                etag: response_etag,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        Ok(FetchOutcome::Ok {
            status: status.as_u16(),
            etag: response_etag,
            body,
        })
    }
}
