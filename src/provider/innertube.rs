//! InnerTube player API provider

use super::client::{HttpClientConfig, VideoClient};
use super::traits::{ByteStream, MediaProvider};
use crate::core::video_info::{RawRendition, VideoMetadata};
use crate::error::VidmuxError;
use crate::utils::mime::{get_container_format, is_audio_mime, is_video_mime, parse_codecs};
use crate::utils::url::extract_video_id;
use async_trait::async_trait;
use futures::TryStreamExt;
use regex::Regex;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_CLIENT_NAME: &str = "ANDROID";
pub const DEFAULT_CLIENT_VERSION: &str = "20.10.38";

/// InnerTube provider configuration
#[derive(Debug, Clone)]
pub struct InnerTubeConfig {
    /// Site origin; overridden in tests
    pub base_url: String,
    /// API key; scraped from the watch page when absent
    pub api_key: Option<String>,
    pub client_name: String,
    pub client_version: String,
    pub http: HttpClientConfig,
}

impl Default for InnerTubeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            http: HttpClientConfig::default(),
        }
    }
}

impl InnerTubeConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set client name and version
    pub fn with_client(mut self, name: &str, version: &str) -> Self {
        self.client_name = name.to_string();
        self.client_version = version.to_string();
        self
    }

    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }
}

/// Provider backed by the InnerTube player endpoint
pub struct InnerTubeProvider {
    http: VideoClient,
    config: InnerTubeConfig,
    api_key: OnceCell<String>,
}

impl InnerTubeProvider {
    pub fn new(config: InnerTubeConfig) -> Result<Self, VidmuxError> {
        let http = VideoClient::with_config(config.http.clone())?;
        let api_key = match &config.api_key {
            Some(key) => OnceCell::new_with(Some(key.clone())),
            None => OnceCell::new(),
        };
        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &InnerTubeConfig {
        &self.config
    }

    async fn api_key(&self, video_id: &str) -> Result<&str, VidmuxError> {
        let key = self
            .api_key
            .get_or_try_init(|| self.scrape_api_key(video_id))
            .await?;
        Ok(key.as_str())
    }

    /// Extract the API key from the watch page HTML
    async fn scrape_api_key(&self, video_id: &str) -> Result<String, VidmuxError> {
        info!("Extracting API key from watch page");
        let url = format!("{}/watch?v={}", self.config.base_url, video_id);
        let request = self.http.create_request(reqwest::Method::GET, &url);
        let body = self.http.fetch_text_with_retry(request).await?;

        let api_key_regex = Regex::new(r#""INNERTUBE_API_KEY":"([^"]+)""#)?;
        let key = api_key_regex
            .captures(&body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(VidmuxError::ApiKeyNotFound)?;

        debug!("Extracted API key: {}...", key.chars().take(10).collect::<String>());
        Ok(key)
    }

    fn client_context(&self) -> serde_json::Value {
        if self.config.client_name == DEFAULT_CLIENT_NAME {
            serde_json::json!({
                "clientName": self.config.client_name,
                "clientVersion": self.config.client_version,
                "androidSdkVersion": 30,
                "osName": "Android",
                "osVersion": "11",
                "userAgent": format!(
                    "com.google.android.youtube/{} (Linux; U; Android 11) gzip",
                    self.config.client_version
                ),
                "hl": "en",
                "gl": "US"
            })
        } else {
            serde_json::json!({
                "clientName": self.config.client_name,
                "clientVersion": self.config.client_version,
                "hl": "en",
                "gl": "US"
            })
        }
    }

    /// Get the player response for a video
    pub async fn get_player_response(&self, video_id: &str) -> Result<PlayerResponse, VidmuxError> {
        info!("Fetching player response for video ID: {}", video_id);
        let api_key = self.api_key(video_id).await?;

        let url = format!(
            "{}/youtubei/v1/player?key={}&prettyPrint=false",
            self.config.base_url, api_key
        );
        let body = serde_json::json!({
            "context": { "client": self.client_context() },
            "videoId": video_id,
            "contentCheckOk": true,
            "racyCheckOk": true
        });

        let mut request = self
            .http
            .create_request(reqwest::Method::POST, &url)
            .header("Content-Type", "application/json")
            .header("X-YouTube-Client-Version", &self.config.client_version);
        if self.config.client_name == DEFAULT_CLIENT_NAME {
            request = request.header("X-YouTube-Client-Name", "3");
        }

        let response: PlayerResponse = self.http.execute_with_retry(request.json(&body)).await?;
        debug!("Player response received successfully");

        if let Some(status) = &response.playability_status {
            status.check()?;
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaProvider for InnerTubeProvider {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, VidmuxError> {
        let video_id = extract_video_id(url)?;
        let response = self.get_player_response(&video_id).await?;
        response.into_metadata(&video_id)
    }

    async fn open_stream(
        &self,
        _url: &str,
        rendition: &RawRendition,
    ) -> Result<ByteStream, VidmuxError> {
        let stream_url = rendition
            .stream_url
            .as_deref()
            .ok_or_else(|| VidmuxError::FormatNotFound(rendition.id.clone()))?;

        debug!("Opening stream {} ({})", rendition.id, rendition.mime_type);
        let response = self.http.create_simple_media_request(stream_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Stream {} returned HTTP {}", rendition.id, status);
            return Err(VidmuxError::Upstream(format!(
                "stream {} returned HTTP {}",
                rendition.id, status
            )));
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        ))
    }
}

/// Player response from InnerTube API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    pub reason: Option<String>,
}

impl PlayabilityStatus {
    /// Map a non-OK status to the matching error
    pub fn check(&self) -> Result<(), VidmuxError> {
        let reason = self.reason.as_deref().unwrap_or_default().to_lowercase();
        let result = match self.status.as_str() {
            "OK" => Ok(()),
            "ERROR" => Err(VidmuxError::VideoUnavailable),
            "AGE_CHECK_REQUIRED" | "AGE_VERIFICATION_REQUIRED" => Err(VidmuxError::AgeRestricted),
            "LOGIN_REQUIRED" if reason.contains("private") => Err(VidmuxError::Private),
            "LOGIN_REQUIRED" if mentions_age(&reason) => Err(VidmuxError::AgeRestricted),
            "LOGIN_REQUIRED" => Err(VidmuxError::LoginRequired),
            "UNPLAYABLE" if reason.contains("private") => Err(VidmuxError::Private),
            "UNPLAYABLE" => Err(VidmuxError::VideoUnavailable),
            other => {
                debug!("Unrecognized playability status: {}", other);
                Ok(())
            }
        };

        if let Err(err) = &result {
            warn!("Video playability error ({}): {}", self.status, err);
        }
        result
    }
}

fn mentions_age(reason: &str) -> bool {
    ["your age", "age-restricted", "age restricted", "inappropriate"]
        .iter()
        .any(|needle| reason.contains(needle))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub length_seconds: Option<String>,
    pub view_count: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub thumbnails: Vec<ThumbnailInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailInfo {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub formats: Vec<FormatData>,
    #[serde(default)]
    pub adaptive_formats: Vec<FormatData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatData {
    pub itag: u32,
    pub url: Option<String>,
    pub mime_type: String,
    pub bitrate: Option<u64>,
    pub average_bitrate: Option<u64>,
    pub quality_label: Option<String>,
    pub content_length: Option<String>,
    pub audio_quality: Option<String>,
    pub signature_cipher: Option<String>,
}

impl FormatData {
    fn into_rendition(self) -> Option<RawRendition> {
        if self.url.is_none() {
            // ciphered URLs are not supported
            debug!(
                "Skipping itag {} without direct URL (ciphered: {})",
                self.itag,
                self.signature_cipher.is_some()
            );
            return None;
        }

        let codecs = parse_codecs(&self.mime_type);
        let has_video = is_video_mime(&self.mime_type);
        let has_audio = is_audio_mime(&self.mime_type)
            || (has_video && (self.audio_quality.is_some() || codecs.len() > 1));

        Some(RawRendition {
            id: self.itag.to_string(),
            has_video,
            has_audio,
            container: get_container_format(&self.mime_type).to_string(),
            quality_label: self.quality_label,
            bitrate: self.bitrate,
            audio_bitrate: if has_audio {
                self.average_bitrate.or(self.bitrate)
            } else {
                None
            },
            content_length: self.content_length.and_then(|s| s.parse().ok()),
            mime_type: self.mime_type,
            stream_url: self.url,
        })
    }
}

impl PlayerResponse {
    /// Convert into provider-neutral metadata
    pub fn into_metadata(self, video_id: &str) -> Result<VideoMetadata, VidmuxError> {
        let details = self.video_details.ok_or(VidmuxError::VideoUnavailable)?;
        let streaming = self.streaming_data.unwrap_or_default();

        let renditions: Vec<RawRendition> = streaming
            .formats
            .into_iter()
            .chain(streaming.adaptive_formats)
            .filter_map(FormatData::into_rendition)
            .collect();
        debug!("Parsed {} renditions for {}", renditions.len(), video_id);

        Ok(VideoMetadata {
            id: if details.video_id.is_empty() {
                video_id.to_string()
            } else {
                details.video_id
            },
            title: details.title,
            author: details.author,
            duration_secs: details
                .length_seconds
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            thumbnail: details
                .thumbnail
                .and_then(|t| t.thumbnails.into_iter().last())
                .map(|t| t.url),
            view_count: details.view_count.and_then(|s| s.parse().ok()).unwrap_or(0),
            // the player endpoint does not report likes
            like_count: 0,
            renditions,
        })
    }
}
