//! Client for the zenoh router's REST plugin
//!
//! A small HTTP/SSE client for a key/value pub-sub data plane: fetch current
//! values matching a key pattern, publish or delete a value under a key, and
//! subscribe to a live stream of updates.
//!
//! # Example
//!
//! ```rust,no_run
//! use zenoh_rest_client::{CancelToken, ZenohClient};
//!
//! #[tokio::main]
//! async fn main() -> zenoh_rest_client::Result<()> {
//!     let client = ZenohClient::new("http://localhost:8000")?;
//!
//!     // Publish a value
//!     client
//!         .put("demo/example/hello", b"hi".to_vec(), Some("text/plain"))
//!         .await?;
//!
//!     // Subscribe to everything under demo/example
//!     let token = CancelToken::new();
//!     client
//!         .subscribe("demo/example/**", token.clone(), |sample| {
//!             println!("{} = {}", sample.key, sample.value_text());
//!         })
//!         .await?;
//!
//!     // Fetch current values
//!     let samples = client.get("demo/example/**").await?;
//!     for sample in &samples {
//!         println!("{}", sample.key);
//!     }
//!
//!     // Cancelling the token stops the subscription and releases its connection
//!     token.cancel();
//!     Ok(())
//! }
//! ```
//!
//! # Scope
//!
//! This is a client, not a broker: it offers no delivery guarantees, no
//! buffering or replay of missed events, and no reconnection policy. Samples
//! carry their payload as an uninterpreted raw JSON value paired with an
//! optional `encoding` hint; the client never imposes a schema.
//!
//! # Testing
//!
//! The `testing` module provides an axum-backed [`testing::TestServer`] for
//! integration tests against an in-process endpoint.

mod client;
mod error;
pub mod streaming;
pub mod testing;
mod types;

pub use client::ZenohClient;
pub use error::{ClientError, OperationError, Result};
pub use types::Sample;

// Re-export streaming types for convenience
pub use streaming::{CancelToken, SampleHandler, SseFrame, SseParser};
