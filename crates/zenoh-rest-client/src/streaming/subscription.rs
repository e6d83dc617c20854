//! Subscription engine
//!
//! Owns the streaming connection for one subscription and drives the
//! parse/dispatch loop on a background task.

use std::panic::AssertUnwindSafe;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::header;
use tracing::{debug, warn};

use super::parser::{SseFrame, SseParser};
use super::types::{CancelToken, SampleHandler};
use crate::error::{ClientError, OperationError, Result};
use crate::types::Sample;

/// Open the event stream and hand it to a background task.
///
/// Returns as soon as the stream is established; establishment failures
/// (non-2xx, connection errors) are returned synchronously and the handler
/// is never invoked. Once this returns `Ok`, the only way to stop delivery
/// is cancelling `token`; later transport errors silently end the stream.
pub(crate) async fn subscribe<H>(
    http: reqwest::Client,
    url: String,
    token: CancelToken,
    handler: H,
) -> Result<()>
where
    H: SampleHandler + 'static,
{
    if token.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    debug!(%url, "connecting to event stream");
    let response = http
        .get(&url)
        .header(header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(OperationError::from_response("GET", &url, response)
            .await
            .into());
    }

    // The spawned task takes sole ownership of the byte stream; dropping it
    // when the task exits releases the connection exactly once.
    let byte_stream = Box::pin(response.bytes_stream());
    tokio::spawn(drive_stream(byte_stream, token, handler, url));

    Ok(())
}

/// Read chunks until cancellation, server close, or a read error, and
/// dispatch every complete frame in arrival order.
async fn drive_stream<S, H>(mut byte_stream: S, token: CancelToken, mut handler: H, url: String)
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
    H: SampleHandler,
{
    let mut parser = SseParser::new();

    loop {
        // Biased so that a pending cancellation always wins over a chunk
        // that is ready at the same time: no dispatch after Closing.
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(%url, "subscription cancelled");
                break;
            }
            chunk = byte_stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for frame in parser.feed(&bytes) {
                    dispatch(frame, &mut handler);
                }
            }
            Some(Err(err)) => {
                debug!(%url, error = %err, "subscription stream read error");
                break;
            }
            None => {
                debug!(%url, "subscription stream closed by server");
                break;
            }
        }
    }
}

/// Decode one frame's payload and deliver it.
///
/// A malformed payload drops that sample only; the stream continues. Handler
/// panics are caught and logged so one bad callback cannot kill delivery.
fn dispatch<H: SampleHandler>(frame: SseFrame, handler: &mut H) {
    if frame.data.is_empty() {
        return;
    }

    debug!(
        event = frame.event.as_deref().unwrap_or(""),
        id = frame.id.as_deref().unwrap_or(""),
        data = %frame.data,
        "sse frame"
    );

    let sample: Sample = match serde_json::from_str(&frame.data) {
        Ok(sample) => sample,
        Err(err) => {
            warn!(
                error = %err,
                event = frame.event.as_deref().unwrap_or(""),
                "skipping frame with malformed sample payload"
            );
            return;
        }
    };

    let key = sample.key.clone();
    if std::panic::catch_unwind(AssertUnwindSafe(|| handler.on_sample(sample))).is_err() {
        warn!(%key, "sample handler panicked; stream continues");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    struct Collected(Vec<String>);

    impl SampleHandler for Collected {
        fn on_sample(&mut self, sample: Sample) {
            self.0.push(sample.key);
        }
    }

    fn frame(data: &str) -> SseFrame {
        SseFrame {
            event: None,
            id: None,
            data: data.to_string(),
        }
    }

    #[test]
    fn test_dispatch_delivers_well_formed_sample() {
        let mut handler = Collected(Vec::new());

        dispatch(frame(r#"{"key":"demo/a","value":1}"#), &mut handler);

        assert_eq!(handler.0, vec!["demo/a"]);
    }

    #[test]
    fn test_dispatch_skips_malformed_payload() {
        let mut handler = Collected(Vec::new());

        dispatch(frame("not json"), &mut handler);
        dispatch(frame(r#"{"key":"demo/b","value":2}"#), &mut handler);

        assert_eq!(handler.0, vec!["demo/b"]);
    }

    #[test]
    fn test_dispatch_survives_handler_panic() {
        let mut count = 0usize;
        let mut handler = |_: Sample| {
            count += 1;
            if count == 1 {
                panic!("boom");
            }
        };

        dispatch(frame(r#"{"key":"demo/a","value":1}"#), &mut handler);
        dispatch(frame(r#"{"key":"demo/b","value":2}"#), &mut handler);

        assert_eq!(count, 2);
    }

    #[test]
    fn test_frames_are_logged_before_decoding() {
        use std::io;

        struct VecWriter(Arc<Mutex<Vec<u8>>>);

        impl io::Write for VecWriter {
            fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(bytes);
                Ok(bytes.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let writer_buf = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || VecWriter(writer_buf.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut handler = Collected(Vec::new());
            dispatch(
                SseFrame {
                    event: Some("PUT".to_string()),
                    id: Some("7".to_string()),
                    data: r#"{"key":"demo/a","value":1}"#.to_string(),
                },
                &mut handler,
            );
            // Malformed frames are logged too, before the decode fails
            dispatch(frame("not json"), &mut handler);
        });

        let output = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(output.contains("PUT"), "event type not logged: {}", output);
        assert!(output.contains("demo/a"), "data not logged: {}", output);
        assert!(
            output.contains("not json"),
            "malformed frame not logged: {}",
            output
        );
    }

    #[tokio::test]
    async fn test_no_dispatch_when_cancelled_and_chunk_both_ready() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![Ok(Bytes::from_static(
            b"data: {\"key\":\"demo/a\",\"value\":1}\n\n",
        ))];
        let byte_stream = futures::stream::iter(chunks);

        let token = CancelToken::new();
        token.cancel();

        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = invocations.clone();
        drive_stream(
            Box::pin(byte_stream),
            token,
            move |_: Sample| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            "stream".to_string(),
        )
        .await;

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }
}
