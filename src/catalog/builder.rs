//! Rendition catalog construction
//!
//! Turns the provider's raw rendition list into a deduplicated, ranked list of
//! downloadable options. Pre-muxed renditions are offered as-is; video-only MP4
//! renditions are paired with the best audio-only rendition and offered as
//! split options; the best audio rendition is also offered on its own.

use super::estimate::{estimate_video_bytes, parse_resolution, AUDIO_DEFAULT_BYTES};
use super::option::{RenditionOption, StreamRefs, AUDIO_ONLY_LABEL, HIGH_QUALITY_SUFFIX};
use crate::core::video_info::RawRendition;
use std::collections::HashSet;
use tracing::debug;

/// Minimum pixel height for a split option to count as high quality
pub const HIGH_QUALITY_MIN_RESOLUTION: u32 = 1080;

/// Build the ranked option list for a set of provider renditions
pub fn build_catalog(renditions: &[RawRendition]) -> Vec<RenditionOption> {
    let mut options = premuxed_options(renditions);

    if let Some(audio) = best_audio(renditions) {
        let audio_bytes = audio.content_length.unwrap_or(AUDIO_DEFAULT_BYTES);

        for video in split_video_candidates(renditions) {
            let Some(quality) = video.quality() else {
                continue;
            };
            let resolution = parse_resolution(quality);
            let is_high_quality = resolution >= HIGH_QUALITY_MIN_RESOLUTION;
            let video_bytes = video
                .content_length
                .unwrap_or_else(|| estimate_video_bytes(resolution));

            options.push(RenditionOption {
                quality: if is_high_quality {
                    format!("{}{}", quality, HIGH_QUALITY_SUFFIX)
                } else {
                    quality.to_string()
                },
                container_format: "mp4".to_string(),
                estimated_size_bytes: video_bytes.saturating_add(audio_bytes),
                resolution,
                is_high_quality,
                stream_refs: StreamRefs::Split {
                    video_stream_id: video.id.clone(),
                    audio_stream_id: audio.id.clone(),
                },
            });
        }

        options.push(RenditionOption {
            quality: AUDIO_ONLY_LABEL.to_string(),
            container_format: "mp3".to_string(),
            estimated_size_bytes: audio_bytes,
            resolution: 0,
            is_high_quality: false,
            stream_refs: StreamRefs::Single {
                stream_id: audio.id.clone(),
            },
        });
    } else {
        debug!("No audio-only rendition, skipping split options");
    }

    sort_options(&mut options);
    debug!(
        "Built catalog with {} options from {} renditions",
        options.len(),
        renditions.len()
    );
    options
}

fn premuxed_options(renditions: &[RawRendition]) -> Vec<RenditionOption> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();

    for rendition in renditions.iter().filter(|r| r.is_premuxed()) {
        let Some(quality) = rendition.quality() else {
            continue;
        };
        // first occurrence of a label wins
        if !seen.insert(quality) {
            continue;
        }

        let resolution = parse_resolution(quality);
        options.push(RenditionOption {
            quality: quality.to_string(),
            container_format: rendition.container.clone(),
            estimated_size_bytes: rendition
                .content_length
                .unwrap_or_else(|| estimate_video_bytes(resolution)),
            resolution,
            is_high_quality: false,
            stream_refs: StreamRefs::Single {
                stream_id: rendition.id.clone(),
            },
        });
    }

    options
}

/// One video-only MP4 rendition per quality label, highest bitrate winning
fn split_video_candidates(renditions: &[RawRendition]) -> Vec<&RawRendition> {
    let mut best: Vec<&RawRendition> = Vec::new();

    for rendition in renditions
        .iter()
        .filter(|r| r.is_video_only() && r.container == "mp4" && r.quality().is_some())
    {
        match best.iter_mut().find(|b| b.quality() == rendition.quality()) {
            Some(slot) => {
                if rendition.bitrate.unwrap_or(0) > slot.bitrate.unwrap_or(0) {
                    *slot = rendition;
                }
            }
            None => best.push(rendition),
        }
    }

    best
}

/// Audio-only rendition with the highest audio bitrate, first one on ties
fn best_audio(renditions: &[RawRendition]) -> Option<&RawRendition> {
    renditions
        .iter()
        .filter(|r| r.is_audio_only())
        .fold(None, |best: Option<&RawRendition>, r| match best {
            Some(b) if r.audio_bitrate.unwrap_or(0) <= b.audio_bitrate.unwrap_or(0) => Some(b),
            _ => Some(r),
        })
}

/// Audio last, then resolution descending, then high quality first.
/// `sort_by` is stable so remaining ties keep insertion order.
fn sort_options(options: &mut [RenditionOption]) {
    options.sort_by(|a, b| {
        a.is_audio_only()
            .cmp(&b.is_audio_only())
            .then_with(|| b.resolution.cmp(&a.resolution))
            .then_with(|| b.is_high_quality.cmp(&a.is_high_quality))
    });
}
