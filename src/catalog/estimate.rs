//! Static size estimates for renditions without an exact length

use regex::Regex;
use std::sync::OnceLock;

const MB: u64 = 1024 * 1024;

/// Estimated video sizes keyed by pixel height
const VIDEO_SIZE_TABLE: [(u32, u64); 8] = [
    (144, 2 * MB),
    (240, 4 * MB),
    (360, 8 * MB),
    (480, 15 * MB),
    (720, 25 * MB),
    (1080, 50 * MB),
    (1440, 80 * MB),
    (2160, 150 * MB),
];

/// Fallback for resolutions missing from the table
pub const VIDEO_FALLBACK_BYTES: u64 = 10 * MB;

/// Assumed size of the audio track when the provider reports none
pub const AUDIO_DEFAULT_BYTES: u64 = 3 * MB;

/// Estimate the size of a video stream at the given resolution
pub fn estimate_video_bytes(resolution: u32) -> u64 {
    VIDEO_SIZE_TABLE
        .iter()
        .find(|(height, _)| *height == resolution)
        .map(|(_, bytes)| *bytes)
        .unwrap_or(VIDEO_FALLBACK_BYTES)
}

fn resolution_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)p").expect("static regex"))
}

/// Parse the pixel height out of a quality label such as "1080p60"
///
/// Returns 0 when the label carries no `<digits>p` token.
pub fn parse_resolution(label: &str) -> u32 {
    resolution_regex()
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
