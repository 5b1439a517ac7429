//! URL utilities for recognizing video URLs and extracting video IDs

use crate::error::VidmuxError;
use url::Url;

const WATCH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes that carry the video ID as the next segment
const ID_PATH_PREFIXES: &[&str] = &["/shorts/", "/embed/", "/live/", "/v/"];

fn parse_lenient(url: &str) -> Result<Url, VidmuxError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(VidmuxError::InvalidUrl("URL is required".to_string()));
    }
    if trimmed.contains("://") {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("https://{}", trimmed))?)
    }
}

fn checked_id(candidate: &str) -> Result<String, VidmuxError> {
    let id = candidate.split('/').next().unwrap_or_default();
    if id.is_empty() {
        return Err(VidmuxError::InvalidUrl("Missing video ID".to_string()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(VidmuxError::InvalidUrl(format!("Malformed video ID: {}", id)));
    }
    Ok(id.to_string())
}

/// Extract the video ID from any recognized video URL shape
pub fn extract_video_id(url: &str) -> Result<String, VidmuxError> {
    let parsed = parse_lenient(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(VidmuxError::InvalidUrl(format!(
            "Unsupported scheme: {}",
            parsed.scheme()
        )));
    }

    let host = parsed.host_str().unwrap_or_default();
    let path = parsed.path();

    if SHORT_HOSTS.contains(&host) {
        return checked_id(path.trim_start_matches('/'));
    }

    if !WATCH_HOSTS.contains(&host) {
        return Err(VidmuxError::InvalidUrl(
            "Not a supported video platform URL".to_string(),
        ));
    }

    if path == "/watch" || path == "/watch/" {
        let id = parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| VidmuxError::InvalidUrl("Missing v parameter".to_string()))?;
        return checked_id(&id);
    }

    ID_PATH_PREFIXES
        .iter()
        .find_map(|prefix| path.strip_prefix(prefix))
        .map(checked_id)
        .unwrap_or_else(|| {
            Err(VidmuxError::InvalidUrl(
                "Unsupported video URL format".to_string(),
            ))
        })
}

/// Canonical watch URL for a video ID
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=10s",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ&list=RDxx",
            "https://youtu.be/dQw4w9WgXcQ?t=10",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?feature=share",
            "https://YOUTU.BE/dQw4w9WgXcQ",
            "http://www.youtube.com/watch?v=dQw4w9WgXcQ#t=10s",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
        ];
        for case in cases {
            assert_eq!(extract_video_id(case).unwrap(), "dQw4w9WgXcQ", "{}", case);
        }
    }

    #[test]
    fn test_rejected_urls() {
        let cases = [
            "",
            "   ",
            "not a url",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://vimeo.com/12345",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=",
            "https://youtu.be/",
            "https://www.youtube.com/shorts/",
            "https://www.youtube.com/channel/UCxxx",
            "https://www.youtube.com/playlist?list=PLxxxx",
            "ftp://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=<script>",
        ];
        for case in cases {
            assert!(extract_video_id(case).is_err(), "{}", case);
        }
    }

    #[test]
    fn test_errors_are_invalid_input() {
        let err = extract_video_id("https://example.com").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}
