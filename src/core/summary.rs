//! Analysis response: display metadata plus the ranked option list

use crate::catalog::{build_catalog, RenditionOption};
use crate::core::video_info::VideoMetadata;
use crate::utils::format::{format_count, format_duration};
use serde::{Deserialize, Serialize};

/// What a client sees after analyzing a URL
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub title: String,
    pub thumbnail: Option<String>,
    /// `H:MM:SS` or `M:SS`
    pub duration: String,
    /// Abbreviated view count
    pub views: String,
    /// Abbreviated like count
    pub likes: String,
    pub author: String,
    /// Ranked, deduplicated download options
    pub formats: Vec<RenditionOption>,
}

impl VideoSummary {
    /// Format the metadata for display and build its catalog
    pub fn from_metadata(metadata: &VideoMetadata) -> Self {
        Self {
            title: metadata.title.clone(),
            thumbnail: metadata.thumbnail.clone(),
            duration: format_duration(metadata.duration_secs),
            views: format_count(metadata.view_count),
            likes: format_count(metadata.like_count),
            author: metadata.author.clone(),
            formats: build_catalog(&metadata.renditions),
        }
    }
}
