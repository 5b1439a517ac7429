//! Downloadable options presented to clients

use serde::{Deserialize, Serialize};

/// Label used for the audio-only option
pub const AUDIO_ONLY_LABEL: &str = "Audio Only";

/// Suffix appended to split-stream options at 1080p and above
pub const HIGH_QUALITY_SUFFIX: &str = " (High Quality)";

/// Provider streams an option is assembled from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamRefs {
    /// Pre-muxed video or audio-only stream
    #[serde(rename_all = "camelCase")]
    Single { stream_id: String },
    /// Separate video and audio streams that must be muxed
    #[serde(rename_all = "camelCase")]
    Split {
        video_stream_id: String,
        audio_stream_id: String,
    },
}

/// A downloadable option as shown to the client and round-tripped on download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionOption {
    /// Display label, possibly annotated with the high quality suffix
    pub quality: String,
    /// Target container ("mp4" or "mp3")
    pub container_format: String,
    /// Exact size when known, otherwise an estimate
    pub estimated_size_bytes: u64,
    /// Pixel height, 0 for audio-only
    pub resolution: u32,
    /// Separate video and audio at 1080p or above
    pub is_high_quality: bool,
    #[serde(flatten)]
    pub stream_refs: StreamRefs,
}

impl RenditionOption {
    pub fn is_audio_only(&self) -> bool {
        self.quality == AUDIO_ONLY_LABEL
    }

    /// File extension for the delivered body
    pub fn extension(&self) -> &str {
        if self.container_format.is_empty() {
            "mp4"
        } else {
            &self.container_format
        }
    }

    /// Content type of the delivered body
    pub fn content_type(&self) -> &'static str {
        if self.container_format == "mp3" {
            "audio/mpeg"
        } else {
            "video/mp4"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn single() -> RenditionOption {
        RenditionOption {
            quality: "360p".into(),
            container_format: "mp4".into(),
            estimated_size_bytes: 1234,
            resolution: 360,
            is_high_quality: false,
            stream_refs: StreamRefs::Single {
                stream_id: "18".into(),
            },
        }
    }

    #[test]
    fn test_single_json_shape() {
        let value = serde_json::to_value(single()).unwrap();
        assert_eq!(
            value,
            json!({
                "quality": "360p",
                "containerFormat": "mp4",
                "estimatedSizeBytes": 1234,
                "resolution": 360,
                "isHighQuality": false,
                "streamId": "18"
            })
        );
    }

    #[test]
    fn test_split_parses_from_client_json() {
        let option: RenditionOption = serde_json::from_value(json!({
            "quality": "1080p (High Quality)",
            "containerFormat": "mp4",
            "estimatedSizeBytes": 55574528,
            "resolution": 1080,
            "isHighQuality": true,
            "videoStreamId": "137",
            "audioStreamId": "140"
        }))
        .unwrap();

        assert_eq!(
            option.stream_refs,
            StreamRefs::Split {
                video_stream_id: "137".into(),
                audio_stream_id: "140".into()
            }
        );
        assert_eq!(option.content_type(), "video/mp4");
    }

    #[test]
    fn test_missing_refs_rejected() {
        let result: Result<RenditionOption, _> = serde_json::from_value(json!({
            "quality": "360p",
            "containerFormat": "mp4",
            "estimatedSizeBytes": 1,
            "resolution": 360,
            "isHighQuality": false
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_audio_content_type() {
        let mut option = single();
        option.quality = AUDIO_ONLY_LABEL.into();
        option.container_format = "mp3".into();
        assert!(option.is_audio_only());
        assert_eq!(option.content_type(), "audio/mpeg");
        assert_eq!(option.extension(), "mp3");
    }
}
