//! HTTP client for the zenoh REST plugin

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, OperationError, Result};
use crate::streaming::{self, CancelToken, SampleHandler};
use crate::types::Sample;

/// Client for a zenoh REST endpoint.
///
/// Configuration (base address, default headers) is fixed at construction;
/// the client is `Clone` and safe for concurrent use by any number of
/// in-flight operations. No request timeout is configured, deliberately:
/// subscription streams must be able to run indefinitely, bounded only by
/// their cancellation token.
#[derive(Debug, Clone)]
pub struct ZenohClient {
    http: reqwest::Client,
    /// Base address, stored without a trailing slash
    base_url: String,
}

impl ZenohClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base address of the REST plugin (e.g. "http://localhost:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_headers(base_url, HeaderMap::new())
    }

    /// Create a client that sends the given headers with every request.
    ///
    /// Per-request headers (the SSE `Accept`, put's `Content-Type`) take
    /// precedence over these defaults on conflict.
    pub fn with_headers(base_url: &str, headers: HeaderMap) -> Result<Self> {
        // Reject an unusable base address up front, before any request
        Url::parse(base_url)?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client that sends a bearer token with every request
    pub fn with_bearer_token(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ClientError::Decode(format!("Invalid auth token: {}", e)))?;
        headers.insert(header::AUTHORIZATION, value);
        Self::with_headers(base_url, headers)
    }

    /// The configured base address, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client.
    ///
    /// Useful for custom requests that should reuse the connection pool and
    /// default headers.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch the current values matching a key selector.
    ///
    /// The selector may contain wildcard segments (`*`, `**`); they are
    /// passed through to the server uninterpreted. Returns the samples in
    /// the order the server listed them. A malformed body yields
    /// [`ClientError::Decode`] and no partial results.
    #[instrument(skip(self))]
    pub async fn get(&self, selector: &str) -> Result<Vec<Sample>> {
        let url = self.join(selector);
        debug!(%url, "fetching samples");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(OperationError::from_response("GET", &url, response)
                .await
                .into());
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Publish a value under a key expression.
    ///
    /// A non-empty `content_type` hint is sent as the request's
    /// `Content-Type` header so the server can store a typed value.
    /// The response body is not parsed.
    #[instrument(skip(self, payload))]
    pub async fn put(
        &self,
        key_expr: &str,
        payload: impl Into<Vec<u8>>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let url = self.join(key_expr);
        debug!(%url, "publishing value");

        let mut request = self.http.put(&url).body(payload.into());
        if let Some(content_type) = content_type.filter(|ct| !ct.is_empty()) {
            request = request.header(header::CONTENT_TYPE, content_type);
        }

        let response = request.send().await?;
        self.check_status("PUT", &url, response).await
    }

    /// Delete the value under a key expression
    #[instrument(skip(self))]
    pub async fn delete(&self, key_expr: &str) -> Result<()> {
        let url = self.join(key_expr);
        debug!(%url, "deleting value");

        let response = self.http.delete(&url).send().await?;
        self.check_status("DELETE", &url, response).await
    }

    /// Subscribe to live updates matching a key expression.
    ///
    /// Opens an SSE stream and spawns a background task that invokes
    /// `handler` once per decoded sample, in wire order. Returns as soon as
    /// the stream is established. Cancelling `token` stops delivery and
    /// releases the connection; cancelling it again is a no-op.
    ///
    /// If establishment fails (non-2xx status, connection error) the error
    /// is returned here and the handler is never invoked. After
    /// establishment, transport errors silently end the stream: the only
    /// observable effect is that the handler stops being called.
    #[instrument(skip(self, token, handler))]
    pub async fn subscribe<H>(&self, key_expr: &str, token: CancelToken, handler: H) -> Result<()>
    where
        H: SampleHandler + 'static,
    {
        let url = self.join(key_expr);
        streaming::subscribe(self.http.clone(), url, token, handler).await
    }

    /// Concatenate the base address and a key/selector.
    ///
    /// Plain string concatenation, not relative-URL resolution: wildcard
    /// characters must reach the server exactly as written.
    fn join(&self, suffix: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            suffix.strip_prefix('/').unwrap_or(suffix)
        )
    }

    async fn check_status(
        &self,
        op: &'static str,
        url: &str,
        response: reqwest::Response,
    ) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(OperationError::from_response(op, url, response)
                .await
                .into())
        }
    }
}
