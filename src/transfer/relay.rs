//! Single-stream relay into the response body

use super::{stream_error, Deadline};
use crate::provider::ByteStream;
use bytes::Bytes;
use futures::Stream;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::time::Sleep;
use tracing::{error, info};

/// Forwards one provider stream chunk by chunk
///
/// The relay is pulled by the response body, so at most one chunk is in
/// flight. After the source ends, fails, or the deadline passes, the source is
/// dropped and the relay yields nothing further. Dropping the relay drops the
/// source.
pub struct RelayStream {
    label: String,
    source: Option<ByteStream>,
    deadline: Pin<Box<Sleep>>,
    expiry: Deadline,
    forwarded: u64,
}

impl RelayStream {
    pub fn new(label: impl Into<String>, source: ByteStream, deadline: Deadline) -> Self {
        Self {
            label: label.into(),
            source: Some(source),
            deadline: Box::pin(deadline.sleep()),
            expiry: deadline,
            forwarded: 0,
        }
    }

    /// Bytes forwarded so far
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    fn finish(&mut self) {
        self.source = None;
    }
}

impl Stream for RelayStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let Some(source) = this.source.as_mut() else {
            return Poll::Ready(None);
        };

        if this.deadline.as_mut().poll(cx).is_ready() {
            error!(
                "Relay {} timed out after {} bytes",
                this.label, this.forwarded
            );
            this.finish();
            return Poll::Ready(Some(Err(stream_error(this.expiry.error()))));
        }

        match source.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.forwarded += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                error!(
                    "Relay {} aborted after {} bytes: {}",
                    this.label, this.forwarded, err
                );
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                info!("Relay {} completed, {} bytes", this.label, this.forwarded);
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if self.source.is_some() {
            info!(
                "Relay {} cancelled by client after {} bytes",
                self.label, self.forwarded
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chunks, failing_after, pending_forever, DropFlag};
    use futures::StreamExt;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_forwards_in_order() {
        let relay = RelayStream::new("test", chunks(&[b"ab", b"cd", b"ef"]), deadline());
        let items: Vec<Bytes> = relay.map(|c| c.unwrap()).collect().await;
        assert_eq!(items, vec![Bytes::from("ab"), Bytes::from("cd"), Bytes::from("ef")]);
    }

    #[tokio::test]
    async fn test_error_propagates_then_fuses() {
        let mut relay = RelayStream::new("test", failing_after(&[b"ok"], "boom"), deadline());
        assert_eq!(relay.next().await.unwrap().unwrap(), Bytes::from("ok"));
        let err = relay.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(relay.next().await.is_none());
        assert_eq!(relay.forwarded(), 2);
    }

    #[tokio::test]
    async fn test_drop_releases_source() {
        let flag = DropFlag::new();
        let relay = RelayStream::new("test", flag.wrap(chunks(&[b"x"])), deadline());
        assert!(!flag.dropped());
        drop(relay);
        assert!(flag.dropped());
    }

    #[tokio::test]
    async fn test_source_released_at_end() {
        let flag = DropFlag::new();
        let mut relay = RelayStream::new("test", flag.wrap(chunks(&[b"x"])), deadline());
        while relay.next().await.is_some() {}
        assert!(flag.dropped());
    }

    #[tokio::test]
    async fn test_deadline_aborts_stalled_source() {
        let flag = DropFlag::new();
        let mut relay = RelayStream::new(
            "test",
            flag.wrap(pending_forever()),
            Deadline::after(Duration::from_millis(50)),
        );
        let err = relay.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(flag.dropped());
        assert!(relay.next().await.is_none());
    }
}
