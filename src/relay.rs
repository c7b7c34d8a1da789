//! Streaming relay core
//!
//! Turns a provider [`EventStream`] into the plain text stream sent to the
//! client. Two pieces:
//!
//! - [`text_deltas`] filters events down to non-empty text fragments, in
//!   arrival order, without buffering.
//! - [`spawn_relay`] drives that filter on a producer task feeding a bounded
//!   channel. The receiving half becomes the HTTP response body. When the
//!   receiver is dropped (client disconnected) the producer stops and drops
//!   the upstream stream, which aborts the provider call.
//!
//! A mid-stream provider failure is forwarded as an `Err` item so the HTTP
//! layer terminates the body abnormally instead of ending it cleanly.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::RagchatError;
use crate::providers::EventStream;

/// Filter provider events down to non-empty text deltas
///
/// Every non-text event is discarded. An upstream error is passed through
/// and ends the output.
pub fn text_deltas(
    events: EventStream,
) -> impl Stream<Item = Result<String, RagchatError>> + Send {
    events
        .scan(false, |failed, item| {
            if *failed {
                return futures::future::ready(None);
            }
            *failed = item.is_err();
            futures::future::ready(Some(item))
        })
        .filter_map(|item| async move {
            match item {
                Ok(event) => event
                    .text_delta()
                    .filter(|text| !text.is_empty())
                    .map(|text| Ok(text.to_string())),
                Err(e) => Some(Err(e)),
            }
        })
}

/// Outgoing body stream produced by [`spawn_relay`]
pub type RelayStream = ReceiverStream<Result<Bytes, RagchatError>>;

/// Spawn the producer task relaying `events` into a bounded channel
///
/// Each text delta is sent as its own chunk. The task exits when the
/// upstream ends, fails, or the returned stream is dropped.
pub fn spawn_relay(events: EventStream, capacity: usize) -> RelayStream {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        let deltas = text_deltas(events);
        futures::pin_mut!(deltas);
        let mut chunks = 0usize;
        let mut bytes = 0usize;

        loop {
            tokio::select! {
                biased;
                _ = tx.closed() => {
                    tracing::info!(chunks, "Client disconnected; aborting upstream stream");
                    break;
                }
                next = deltas.next() => match next {
                    Some(Ok(text)) => {
                        chunks += 1;
                        bytes += text.len();
                        if tx.send(Ok(Bytes::from(text))).await.is_err() {
                            tracing::info!(chunks, "Client disconnected mid-send");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(chunks, error = %e, "Upstream stream failed mid-flight");
                        let failure =
                            RagchatError::Relay(format!("upstream stream failed: {}", e));
                        let _ = tx.send(Err(failure)).await;
                        break;
                    }
                    None => {
                        tracing::debug!(chunks, bytes, "Upstream stream completed");
                        break;
                    }
                }
            }
        }
    });

    ReceiverStream::new(rx)
}
