//! Provider collaborator contract

use crate::core::video_info::{RawRendition, VideoMetadata};
use crate::error::VidmuxError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// An elementary byte stream: ordered chunks, then end or one error
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Source of video metadata and elementary streams
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Fetch metadata and the list of available renditions for a video URL
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, VidmuxError>;

    /// Open a readable stream for one rendition
    async fn open_stream(
        &self,
        url: &str,
        rendition: &RawRendition,
    ) -> Result<ByteStream, VidmuxError>;
}
