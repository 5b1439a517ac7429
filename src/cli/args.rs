//! Command line argument parsing

use crate::provider::innertube::{DEFAULT_CLIENT_NAME, DEFAULT_CLIENT_VERSION};
use crate::provider::{HttpClientConfig, InnerTubeConfig};
use crate::server::ServerConfig;
use crate::transfer::mux::FfmpegMuxer;
use crate::transfer::TransferConfig;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// vidmux - analyze video URLs and download them, muxing split streams on the fly
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Muxer executable
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "VIDMUX_FFMPEG",
        default_value = "ffmpeg"
    )]
    pub ffmpeg: PathBuf,

    /// AAC bitrate used when muxing
    #[arg(long, global = true, value_name = "RATE", default_value = "192k")]
    pub audio_bitrate: String,

    /// Bound on a whole download (e.g., 10m, 1h)
    #[arg(long, global = true, value_name = "DURATION", default_value = "10m")]
    pub download_timeout: humantime::Duration,

    /// HTTP timeout for provider API calls (e.g., 30s, 1m)
    #[arg(long, global = true, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// HTTP retries for transient provider API errors
    #[arg(long, global = true, default_value = "3")]
    pub retries: u32,

    /// Innertube client name
    #[arg(long, global = true, value_name = "NAME", default_value = DEFAULT_CLIENT_NAME)]
    pub client_name: String,

    /// Innertube client version
    #[arg(long, global = true, value_name = "VERSION", default_value = DEFAULT_CLIENT_VERSION)]
    pub client_version: String,

    /// Override User-Agent header
    #[arg(long, global = true, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, global = true, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(
            long,
            value_name = "ADDR",
            env = "VIDMUX_LISTEN",
            default_value = crate::server::DEFAULT_LISTEN
        )]
        listen: SocketAddr,
    },
    /// Print metadata and the ranked download options
    Analyze {
        /// Video URL
        url: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download one option to a file
    Fetch {
        /// Video URL
        url: String,

        /// Option to download: 'best', 'audio', or a quality label such as '720p'
        #[arg(short = 'f', long, value_name = "QUALITY", default_value = "best")]
        quality: String,

        /// Output path (file or directory)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Disable progress output
        #[arg(long)]
        no_progress: bool,
    },
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Get download timeout as Duration
    pub fn download_timeout_duration(&self) -> Duration {
        self.download_timeout.into()
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::default()
            .with_timeout(self.timeout_duration())
            .with_max_retries(self.retries);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy);
        }
        config
    }

    pub fn innertube_config(&self) -> InnerTubeConfig {
        InnerTubeConfig::default()
            .with_client(&self.client_name, &self.client_version)
            .with_http(self.http_config())
    }

    pub fn transfer_config(&self) -> TransferConfig {
        let muxer = FfmpegMuxer::new(&self.ffmpeg).with_audio_bitrate(&self.audio_bitrate);
        TransferConfig::default()
            .with_download_timeout(self.download_timeout_duration())
            .with_muxer(Arc::new(muxer))
    }

    /// Server configuration, for the `serve` subcommand
    pub fn server_config(&self) -> Option<ServerConfig> {
        match &self.command {
            Command::Serve { listen } => Some(ServerConfig::default().with_listen(*listen)),
            _ => None,
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}
