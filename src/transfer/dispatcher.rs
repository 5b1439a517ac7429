//! Download routing: decides how an option is delivered and prepares the body

use super::mux::{spawn_mux, MuxExit};
use super::relay::RelayStream;
use super::{Deadline, TransferConfig};
use crate::catalog::{RenditionOption, StreamRefs};
use crate::core::video_info::{RawRendition, VideoMetadata};
use crate::error::VidmuxError;
use crate::provider::{ByteStream, MediaProvider};
use crate::utils::filename::to_safe_filename;
use tokio::sync::watch;
use tracing::info;

/// Delivery path for an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Separate video and audio streams muxed on the server
    Mux,
    /// Audio-only stream relayed as-is
    AudioRelay,
    /// Pre-muxed stream relayed as-is
    Relay,
}

/// A prepared download: response headers plus the body stream
pub struct Transfer {
    pub route: Route,
    pub content_type: &'static str,
    pub filename: String,
    /// Set only for single-stream relays whose length the provider reports
    pub content_length: Option<u64>,
    pub body: ByteStream,
    /// Mux outcome, for the mux route only
    pub mux_exit: Option<watch::Receiver<Option<MuxExit>>>,
}

impl Transfer {
    /// `Content-Disposition` header value
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

impl std::fmt::Debug for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("route", &self.route)
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Pick the delivery path for an option
///
/// High quality options are always muxed. Audio-only options are relayed.
/// Anything else is relayed when it names a single stream and muxed when it
/// names a video/audio pair, so audio is never silently dropped.
pub fn plan_route(option: &RenditionOption) -> Route {
    if option.is_high_quality {
        Route::Mux
    } else if option.is_audio_only() {
        Route::AudioRelay
    } else {
        match option.stream_refs {
            StreamRefs::Split { .. } => Route::Mux,
            StreamRefs::Single { .. } => Route::Relay,
        }
    }
}

fn resolve<'a>(metadata: &'a VideoMetadata, id: &str) -> Result<&'a RawRendition, VidmuxError> {
    metadata
        .rendition(id)
        .ok_or_else(|| VidmuxError::FormatNotFound(id.to_string()))
}

/// Prepare the transfer for `option` against freshly fetched `metadata`
///
/// Every stream is opened before this returns, so provider failures surface
/// here rather than after response headers have been sent.
pub async fn dispatch(
    provider: &dyn MediaProvider,
    config: &TransferConfig,
    url: &str,
    metadata: &VideoMetadata,
    option: &RenditionOption,
) -> Result<Transfer, VidmuxError> {
    let route = plan_route(option);
    let deadline = Deadline::after(config.download_timeout);
    let filename = to_safe_filename(&metadata.title, option.extension());
    info!(
        "Dispatching {:?} download of {} ({}) as {}",
        route, metadata.id, option.quality, filename
    );

    match (route, &option.stream_refs) {
        (Route::Mux, StreamRefs::Split {
            video_stream_id,
            audio_stream_id,
        }) => {
            let video = resolve(metadata, video_stream_id)?;
            let audio = resolve(metadata, audio_stream_id)?;
            let video_stream = provider.open_stream(url, video).await?;
            let audio_stream = provider.open_stream(url, audio).await?;

            let session = spawn_mux(
                config.muxer.as_ref(),
                video_stream,
                audio_stream,
                config.channel_capacity,
                deadline,
            )?;

            Ok(Transfer {
                route,
                content_type: option.content_type(),
                filename,
                content_length: None,
                body: Box::pin(session.output),
                mux_exit: Some(session.exit),
            })
        }
        (Route::AudioRelay | Route::Relay, StreamRefs::Single { stream_id }) => {
            let rendition = resolve(metadata, stream_id)?;
            let source = provider.open_stream(url, rendition).await?;
            let label = format!("{}/{}", metadata.id, rendition.id);

            Ok(Transfer {
                route,
                content_type: option.content_type(),
                filename,
                content_length: rendition.content_length,
                body: Box::pin(RelayStream::new(label, source, deadline)),
                mux_exit: None,
            })
        }
        (Route::Mux, StreamRefs::Single { .. }) => Err(VidmuxError::InvalidRequest(
            "high quality format requires separate video and audio streams".to_string(),
        )),
        (_, StreamRefs::Split { .. }) => Err(VidmuxError::InvalidRequest(
            "audio-only format must reference a single stream".to_string(),
        )),
    }
}
