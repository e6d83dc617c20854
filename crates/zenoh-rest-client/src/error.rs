//! Error types for client operations

use std::fmt;

use futures::StreamExt;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// How much of an error response body is kept for diagnosis
const ERROR_BODY_LIMIT: usize = 8 * 1024;

/// Errors that can occur during client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed at the transport level (DNS, connection, TLS, read)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server answered with a non-2xx status
    #[error(transparent)]
    Status(#[from] OperationError),

    /// Response body was not the expected JSON shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Subscription token was already cancelled
    #[error("subscription cancelled")]
    Cancelled,
}

/// A non-2xx HTTP response, with enough context for diagnosis.
///
/// Constructed at the point the response is observed and never retried.
/// The body excerpt is bounded so a large error page cannot blow up memory.
#[derive(Debug)]
pub struct OperationError {
    /// HTTP method of the failed operation (GET/PUT/DELETE)
    pub op: &'static str,
    /// Fully qualified URL the request targeted
    pub url: String,
    /// Numeric status code
    pub status: u16,
    /// Canonical status text, e.g. "Bad Request"
    pub status_text: String,
    /// At most the first 8 KiB of the response body
    pub body: String,
}

impl OperationError {
    /// Build an error from a completed non-2xx response.
    ///
    /// Reads at most [`ERROR_BODY_LIMIT`] bytes of the body; the rest of the
    /// stream is dropped with the response.
    pub(crate) async fn from_response(
        op: &'static str,
        url: &str,
        response: reqwest::Response,
    ) -> Self {
        let status = response.status();
        let body = bounded_body(response).await;
        Self {
            op,
            url: url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failed: {} {}",
            self.op, self.url, self.status, self.status_text
        )?;
        if !self.body.is_empty() {
            write!(f, " {}", self.body)?;
        }
        Ok(())
    }
}

impl std::error::Error for OperationError {}

/// Read a bounded prefix of a response body, tolerating read failures.
async fn bounded_body(response: reqwest::Response) -> String {
    let mut buf = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        let room = ERROR_BODY_LIMIT - buf.len();
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() >= ERROR_BODY_LIMIT {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contains_status_code() {
        let err = OperationError {
            op: "GET",
            url: "http://localhost:8000/bad".to_string(),
            status: 404,
            status_text: "Not Found".to_string(),
            body: "no such key".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("GET"));
        assert!(message.contains("http://localhost:8000/bad"));
        assert!(message.contains("no such key"));
    }

    #[test]
    fn test_status_error_propagates_through_client_error() {
        let err = ClientError::Status(OperationError {
            op: "PUT",
            url: "http://localhost:8000/k".to_string(),
            status: 500,
            status_text: "Internal Server Error".to_string(),
            body: String::new(),
        });
        assert!(err.to_string().contains("500"));
    }
}
