//! MIME type helpers for provider renditions

/// Strip parameters from a MIME type: `video/mp4; codecs="avc1"` -> `video/mp4`
pub fn base_mime(mime_type: &str) -> &str {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

/// Codec list from the `codecs` parameter of a MIME type
pub fn parse_codecs(mime_type: &str) -> Vec<String> {
    mime_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("codecs="))
        .flat_map(|codecs| codecs.trim_matches('"').split(','))
        .map(|codec| codec.trim().to_string())
        .filter(|codec| !codec.is_empty())
        .collect()
}

/// Check if MIME type is a video format
pub fn is_video_mime(mime_type: &str) -> bool {
    base_mime(mime_type).starts_with("video/")
}

/// Check if MIME type is an audio format
pub fn is_audio_mime(mime_type: &str) -> bool {
    base_mime(mime_type).starts_with("audio/")
}

/// Get container format from MIME type
pub fn get_container_format(mime_type: &str) -> &str {
    let base = base_mime(mime_type);
    match base {
        "video/mp4" | "audio/mp4" => "mp4",
        "video/webm" | "audio/webm" => "webm",
        "video/3gpp" => "3gp",
        "video/x-flv" => "flv",
        "video/mp2t" => "ts",
        "audio/mpeg" => "mp3",
        "audio/aac" | "audio/x-aac" => "aac",
        "audio/opus" => "opus",
        _ => base.split('/').nth(1).unwrap_or("unknown"),
    }
}
