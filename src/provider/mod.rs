//! Metadata and stream providers

pub mod client;
pub mod innertube;
pub mod retry;
pub mod traits;

pub use client::{HttpClientConfig, VideoClient};
pub use innertube::{InnerTubeConfig, InnerTubeProvider};
pub use retry::{RetryConfig, RetryExecutor};
pub use traits::{ByteStream, MediaProvider};
