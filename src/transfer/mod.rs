//! Download transfers: routing, single-stream relay and the mux pipeline

pub mod dispatcher;
pub mod mux;
pub mod relay;

use crate::error::VidmuxError;
use mux::{FfmpegMuxer, MuxerCommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Sleep};

pub use dispatcher::{dispatch, plan_route, Route, Transfer};
pub use mux::{MuxExit, MuxSession};
pub use relay::RelayStream;

/// Default bound on a whole download
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default number of muxer output chunks buffered ahead of the client
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Transfer configuration
#[derive(Clone)]
pub struct TransferConfig {
    /// Bound on a whole download, from dispatch to the last byte
    pub download_timeout: Duration,
    /// Muxer output chunks buffered ahead of the client
    pub channel_capacity: usize,
    /// Command used to mux split streams
    pub muxer: Arc<dyn MuxerCommand>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            muxer: Arc::new(FfmpegMuxer::default()),
        }
    }
}

impl std::fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferConfig")
            .field("download_timeout", &self.download_timeout)
            .field("channel_capacity", &self.channel_capacity)
            .field("muxer", &self.muxer.program())
            .finish()
    }
}

impl TransferConfig {
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn with_muxer(mut self, muxer: Arc<dyn MuxerCommand>) -> Self {
        self.muxer = muxer;
        self
    }
}

/// Point in time by which a transfer must finish
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn sleep(&self) -> Sleep {
        tokio::time::sleep_until(self.at)
    }

    pub fn error(&self) -> VidmuxError {
        VidmuxError::Timeout(self.budget)
    }
}

/// Wrap a crate error for delivery through a byte stream
pub(crate) fn stream_error(err: VidmuxError) -> std::io::Error {
    match err {
        VidmuxError::Io(e) => e,
        VidmuxError::Timeout(_) => std::io::Error::new(std::io::ErrorKind::TimedOut, err),
        other => std::io::Error::new(std::io::ErrorKind::Other, other),
    }
}
