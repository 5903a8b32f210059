//! HTTP plumbing for the points API: a browser-like session, a configurable
//! retry policy and a client that ties them to a pluggable transport.

mod client;
mod retry;
mod session;
mod transport;

pub use client::SessionClient;
pub use retry::{RetryPolicy, BAD_GATEWAY, DEFAULT_RETRY_DELAY};
pub use session::{parse_set_cookie, BrowserProfile, Session};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

#[cfg(test)]
pub(crate) use transport::testing;

use thiserror::Error;

/// Longest response body kept in a [`HttpError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum HttpError {
    /// No response was received (connect, proxy, TLS or read failure).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with an error status.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered successfully but the body was not what we expected.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// A bounded retry policy ran out of attempts.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<HttpError> },

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

impl HttpError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        HttpError::Status { status, body }
    }

    /// HTTP status of the response that caused this error, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::RetriesExhausted { last, .. } => last.status_code(),
            _ => None,
        }
    }
}
