//! Video metadata and rendition structures

use serde::{Deserialize, Serialize};

/// Video metadata as reported by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Provider video ID
    pub id: String,
    /// Video title
    pub title: String,
    /// Video author/channel name
    pub author: String,
    /// Video duration in seconds
    pub duration_secs: u64,
    /// Video thumbnail URL
    pub thumbnail: Option<String>,
    /// Video view count
    pub view_count: u64,
    /// Video like count
    pub like_count: u64,
    /// Available renditions, in provider order
    pub renditions: Vec<RawRendition>,
}

impl VideoMetadata {
    /// Create metadata with no renditions
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            duration_secs: 0,
            thumbnail: None,
            view_count: 0,
            like_count: 0,
            renditions: Vec::new(),
        }
    }

    /// Look up a rendition by its exact stream identifier
    pub fn rendition(&self, id: &str) -> Option<&RawRendition> {
        self.renditions.iter().find(|r| r.id == id)
    }
}

/// A single stream the provider can deliver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRendition {
    /// Opaque stream identifier
    pub id: String,
    /// Stream carries video
    pub has_video: bool,
    /// Stream carries audio
    pub has_audio: bool,
    /// Container name (e.g. "mp4", "webm")
    pub container: String,
    /// Quality label (e.g. "720p", "1080p60")
    pub quality_label: Option<String>,
    /// Overall bitrate in bits per second
    pub bitrate: Option<u64>,
    /// Audio bitrate in bits per second
    pub audio_bitrate: Option<u64>,
    /// Exact byte length, when the provider reports it
    pub content_length: Option<u64>,
    /// MIME type
    pub mime_type: String,
    /// Provider-private locator, never sent to clients
    #[serde(skip)]
    pub stream_url: Option<String>,
}

impl RawRendition {
    /// Create a rendition with the given id and MIME type
    pub fn new(id: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: id.into(),
            has_video: mime_type.starts_with("video/"),
            has_audio: mime_type.starts_with("audio/"),
            container: crate::utils::mime::get_container_format(&mime_type).to_string(),
            quality_label: None,
            bitrate: None,
            audio_bitrate: None,
            content_length: None,
            mime_type,
            stream_url: None,
        }
    }

    /// Video and audio muxed into one stream
    pub fn is_premuxed(&self) -> bool {
        self.has_video && self.has_audio
    }

    /// Video without audio
    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }

    /// Audio without video
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Quality label, if present and non-empty
    pub fn quality(&self) -> Option<&str> {
        self.quality_label.as_deref().filter(|q| !q.is_empty())
    }
}
