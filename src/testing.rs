//! Test doubles shared across modules

use crate::core::video_info::{RawRendition, VideoMetadata};
use crate::error::VidmuxError;
use crate::provider::{ByteStream, MediaProvider};
use crate::transfer::mux::MuxerCommand;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::process::Command;

/// A stream yielding `parts` then ending
pub fn chunks(parts: &[&[u8]]) -> ByteStream {
    let items: Vec<io::Result<Bytes>> = parts
        .iter()
        .map(|p| Ok(Bytes::copy_from_slice(p)))
        .collect();
    Box::pin(stream::iter(items))
}

/// A stream yielding `parts` then one error carrying `message`
pub fn failing_after(parts: &[&[u8]], message: &str) -> ByteStream {
    let err = io::Error::new(io::ErrorKind::Other, message.to_string());
    Box::pin(chunks(parts).chain(stream::once(async move { Err(err) })))
}

/// A stream that never yields
pub fn pending_forever() -> ByteStream {
    Box::pin(stream::pending())
}

/// Records whether a wrapped stream has been dropped
#[derive(Clone, Default)]
pub struct DropFlag(Arc<AtomicBool>);

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Flagged {
    inner: ByteStream,
    _guard: SetOnDrop,
}

impl Stream for Flagged {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl DropFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrap(&self, inner: ByteStream) -> ByteStream {
        Box::pin(Flagged {
            inner,
            _guard: SetOnDrop(self.0.clone()),
        })
    }

    pub fn dropped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// "My Video: Part 1" with one pre-muxed, one video-only and one audio-only rendition
pub fn sample_metadata() -> VideoMetadata {
    let mut meta = VideoMetadata::new("dQw4w9WgXcQ", "My Video: Part 1");
    meta.author = "Channel".to_string();
    meta.duration_secs = 212;
    meta.view_count = 1_500;
    meta.thumbnail = Some("https://i.example/hq.jpg".to_string());

    let mut premuxed = RawRendition::new("18", "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"");
    premuxed.has_audio = true;
    premuxed.quality_label = Some("360p".to_string());
    premuxed.content_length = Some(8);

    let mut video = RawRendition::new("137", "video/mp4; codecs=\"avc1.640028\"");
    video.quality_label = Some("1080p".to_string());
    video.bitrate = Some(4_000_000);

    let mut audio = RawRendition::new("140", "audio/mp4; codecs=\"mp4a.40.2\"");
    audio.audio_bitrate = Some(128_000);
    audio.content_length = Some(5);

    meta.renditions = vec![premuxed, video, audio];
    meta
}

/// In-memory provider serving fixed metadata and per-rendition bytes
pub struct ScriptedProvider {
    metadata: VideoMetadata,
    streams: HashMap<String, Vec<Bytes>>,
    fail_open: HashSet<String>,
    fail_metadata: Option<fn() -> VidmuxError>,
    fetched: AtomicUsize,
    opened: AtomicUsize,
}

impl ScriptedProvider {
    /// Streams default to "premuxed", "video" and "audio" for ids 18, 137 and 140
    pub fn new(metadata: VideoMetadata) -> Self {
        let streams = [("18", "premuxed"), ("137", "video"), ("140", "audio")]
            .into_iter()
            .map(|(id, body)| (id.to_string(), vec![Bytes::from_static(body.as_bytes())]))
            .collect();
        Self {
            metadata,
            streams,
            fail_open: HashSet::new(),
            fail_metadata: None,
            fetched: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn with_stream(mut self, id: &str, parts: &[&[u8]]) -> Self {
        let parts = parts.iter().map(|p| Bytes::copy_from_slice(p)).collect();
        self.streams.insert(id.to_string(), parts);
        self
    }

    /// Opening `id` fails with an upstream error
    pub fn fail_open(mut self, id: &str) -> Self {
        self.fail_open.insert(id.to_string());
        self
    }

    /// Every metadata fetch fails with the error `make` builds
    pub fn fail_metadata(mut self, make: fn() -> VidmuxError) -> Self {
        self.fail_metadata = Some(make);
        self
    }

    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProvider for ScriptedProvider {
    async fn fetch_metadata(&self, _url: &str) -> Result<VideoMetadata, VidmuxError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        match self.fail_metadata {
            Some(make) => Err(make()),
            None => Ok(self.metadata.clone()),
        }
    }

    async fn open_stream(
        &self,
        _url: &str,
        rendition: &RawRendition,
    ) -> Result<ByteStream, VidmuxError> {
        if self.fail_open.contains(&rendition.id) {
            return Err(VidmuxError::Upstream(format!(
                "stream {} returned 403",
                rendition.id
            )));
        }
        let parts = self
            .streams
            .get(&rendition.id)
            .cloned()
            .ok_or_else(|| VidmuxError::FormatNotFound(rendition.id.clone()))?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::pin(stream::iter(parts.into_iter().map(Ok::<Bytes, io::Error>))))
    }
}

/// Muxer double that concatenates video then audio onto stdout
pub struct CatMuxer;

impl MuxerCommand for CatMuxer {
    fn program(&self) -> String {
        "cat".to_string()
    }

    fn build(&self, video: &Path, audio: &Path) -> Command {
        let mut command = Command::new("cat");
        command.arg(video).arg(audio);
        command
    }
}
