//! Live subscriptions over Server-Sent Events
//!
//! A subscription is one long-lived `GET` with `Accept: text/event-stream`.
//! The server keeps the response open and writes one frame per update; a
//! background task parses frames incrementally and hands each decoded
//! [`Sample`](crate::Sample) to the caller's handler, in wire order, until
//! the caller cancels, the server closes the stream, or a read error occurs.
//!
//! # Example
//!
//! ```no_run
//! use zenoh_rest_client::{CancelToken, ZenohClient};
//!
//! # async fn example() -> zenoh_rest_client::Result<()> {
//! let client = ZenohClient::new("http://localhost:8000")?;
//!
//! let token = CancelToken::new();
//! client
//!     .subscribe("demo/example/**", token.clone(), |sample| {
//!         println!("{} = {}", sample.key, sample.value_text());
//!     })
//!     .await?;
//!
//! // ... later: stop delivery and release the connection
//! token.cancel();
//! # Ok(())
//! # }
//! ```

mod parser;
mod subscription;
mod types;

pub use parser::{SseFrame, SseParser};
pub use types::{CancelToken, SampleHandler};

pub(crate) use subscription::subscribe;
