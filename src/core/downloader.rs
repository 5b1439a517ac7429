//! Analyze and download entry points shared by the HTTP API and the CLI

use crate::catalog::RenditionOption;
use crate::core::summary::VideoSummary;
use crate::error::VidmuxError;
use crate::provider::MediaProvider;
use crate::transfer::{dispatch, Transfer, TransferConfig};
use crate::utils::url::extract_video_id;
use std::sync::Arc;
use tracing::{debug, info};

/// Option selection for non-interactive downloads
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSelector {
    /// First option in catalog order
    Best,
    /// The audio-only option
    Audio,
    /// Option whose display label matches, ignoring case and the high quality suffix
    Label(String),
}

impl OptionSelector {
    /// Parse a selector: `best`, `audio`, or a quality label such as `720p`
    pub fn from_str(s: &str) -> Result<Self, String> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => Err("Empty quality selector".to_string()),
            "best" => Ok(OptionSelector::Best),
            "audio" | "audio only" => Ok(OptionSelector::Audio),
            _ => Ok(OptionSelector::Label(s.to_string())),
        }
    }

    /// Pick an option from a ranked catalog
    pub fn select<'a>(&self, options: &'a [RenditionOption]) -> Option<&'a RenditionOption> {
        match self {
            OptionSelector::Best => options.iter().find(|o| !o.is_audio_only()),
            OptionSelector::Audio => options.iter().find(|o| o.is_audio_only()),
            OptionSelector::Label(label) => {
                let wanted = label.to_lowercase();
                options.iter().find(|o| {
                    let quality = o.quality.to_lowercase();
                    quality == wanted || quality.split(" (").next() == Some(wanted.as_str())
                })
            }
        }
    }
}

/// Front door for analysis and downloads over a provider
#[derive(Clone)]
pub struct Downloader {
    provider: Arc<dyn MediaProvider>,
    transfer: TransferConfig,
}

impl Downloader {
    /// Create a downloader with the default transfer configuration
    pub fn new(provider: Arc<dyn MediaProvider>) -> Self {
        Self {
            provider,
            transfer: TransferConfig::default(),
        }
    }

    /// Set transfer configuration
    pub fn with_transfer_config(mut self, config: TransferConfig) -> Self {
        self.transfer = config;
        self
    }

    pub fn transfer_config(&self) -> &TransferConfig {
        &self.transfer
    }

    fn validate(url: &str) -> Result<&str, VidmuxError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(VidmuxError::InvalidRequest("URL is required".to_string()));
        }
        extract_video_id(url)?;
        Ok(url)
    }

    /// Fetch metadata and build the ranked option list
    pub async fn analyze(&self, url: &str) -> Result<VideoSummary, VidmuxError> {
        let url = Self::validate(url)?;
        info!("Analyzing {}", url);

        let metadata = self.provider.fetch_metadata(url).await?;
        let summary = VideoSummary::from_metadata(&metadata);
        debug!(
            "{} renditions became {} options for {}",
            metadata.renditions.len(),
            summary.formats.len(),
            metadata.id
        );
        Ok(summary)
    }

    /// Re-fetch metadata and start the transfer for a previously offered option
    ///
    /// Stream identifiers from an earlier analysis may be stale; they are
    /// resolved against the fresh metadata and a miss is reported as not found.
    pub async fn download(
        &self,
        url: &str,
        option: &RenditionOption,
    ) -> Result<Transfer, VidmuxError> {
        let url = Self::validate(url)?;
        let metadata = self.provider.fetch_metadata(url).await?;
        dispatch(self.provider.as_ref(), &self.transfer, url, &metadata, option).await
    }
}
