//! # vidmux - video analysis and download service
//!
//! Analyzes a video URL into a ranked list of download options and streams
//! the chosen option to the client, muxing separate video and audio streams
//! through ffmpeg when no pre-muxed rendition exists.
//!
//! ## Features
//!
//! - Deduplicated, ranked rendition catalog with size estimates
//! - Pass-through relay for pre-muxed and audio-only renditions
//! - Server-side muxing through named pipes with bounded buffering
//! - Cancellation and timeouts that release every upstream resource
//! - HTTP API (axum) and a CLI front-end
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidmux::core::Downloader;
//! use vidmux::provider::{InnerTubeConfig, InnerTubeProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = InnerTubeProvider::new(InnerTubeConfig::default())?;
//!     let downloader = Downloader::new(Arc::new(provider));
//!
//!     let summary = downloader.analyze("https://youtu.be/dQw4w9WgXcQ").await?;
//!     for option in &summary.formats {
//!         println!("{} ({} bytes)", option.quality, option.estimated_size_bytes);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod core;
pub mod error;
pub mod provider;
pub mod server;
pub mod transfer;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export main types
pub use catalog::{build_catalog, RenditionOption, StreamRefs};
pub use self::core::{Downloader, RawRendition, VideoMetadata, VideoSummary};
pub use error::{ErrorKind, VidmuxError};
pub use provider::{ByteStream, MediaProvider};
pub use transfer::{MuxExit, Route, Transfer, TransferConfig};

/// Result type alias for vidmux operations
pub type Result<T> = std::result::Result<T, VidmuxError>;
