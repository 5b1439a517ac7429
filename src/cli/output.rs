//! Output formatting and progress display

use crate::catalog::RenditionOption;
use crate::cli::args::VerbosityLevel;
use crate::core::progress::Progress;
use crate::core::VideoSummary;
use crate::utils::format::format_bytes;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {msg}";

/// Output formatter for vidmux
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a progress bar, or a spinner when the size is unknown
    pub fn create_progress_bar(&mut self, total_size: Option<u64>) -> Option<ProgressBar> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let (progress_bar, template) = match total_size {
            Some(total) => (ProgressBar::new(total), BAR_TEMPLATE),
            None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
        };
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            progress_bar.set_style(style.progress_chars("#>-"));
        }
        progress_bar.set_message("Downloading...");
        progress_bar.enable_steady_tick(Duration::from_millis(120));

        self.progress_bar = Some(progress_bar.clone());
        Some(progress_bar)
    }

    /// Update progress bar
    pub fn update_progress(&self, progress: &Progress) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_position(progress.downloaded_size);
            if progress.speed.is_some() {
                progress_bar.set_message(progress.speed_string());
            }
        }
    }

    /// Finish progress bar
    pub fn finish_progress(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_with_message(message.to_string());
        }
    }

    /// Stop the progress bar where it is
    pub fn abandon_progress(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.abandon_with_message(message.to_string());
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{} {}", "info:".blue().bold(), message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{} {}", "done:".green().bold(), message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    /// Print debug message
    pub fn debug(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Verbose {
            println!("{} {}", "debug:".dimmed(), message);
        }
    }

    /// Print video metadata and the ranked options as a table
    pub fn print_summary(&self, summary: &VideoSummary) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("{}", summary.title.bold());
        println!("{} {}", "Author:".dimmed(), summary.author);
        println!(
            "{} {}   {} {}   {} {}",
            "Duration:".dimmed(),
            summary.duration,
            "Views:".dimmed(),
            summary.views,
            "Likes:".dimmed(),
            summary.likes
        );
        if let Some(thumbnail) = &summary.thumbnail {
            println!("{} {}", "Thumbnail:".dimmed(), thumbnail);
        }
        println!();

        println!(
            "  {:<24} {:<6} {:>10}  {}",
            "QUALITY".bold(),
            "EXT".bold(),
            "SIZE".bold(),
            "STREAMS".bold()
        );
        for option in &summary.formats {
            println!("{}", format_option_row(option));
        }
        println!();
    }

    /// Print download start message
    pub fn print_download_start(&self, quality: &str, output_path: &str) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("{} {}", "Downloading".green().bold(), quality);
        println!("{} {}", "Output:".dimmed(), output_path);
    }

    /// Print download complete message
    pub fn print_download_complete(&self, output_path: &str, bytes: u64, duration: Duration) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!(
            "{} {} ({}) in {}",
            "Saved".green().bold(),
            output_path,
            format_bytes(bytes),
            humantime::format_duration(Duration::from_secs(duration.as_secs()))
        );
    }
}

/// One table row for an option, colored by delivery path
pub fn format_option_row(option: &RenditionOption) -> String {
    use crate::catalog::StreamRefs;

    let streams = match &option.stream_refs {
        StreamRefs::Single { stream_id } => stream_id.clone(),
        StreamRefs::Split {
            video_stream_id,
            audio_stream_id,
        } => format!("{}+{}", video_stream_id, audio_stream_id),
    };
    let quality = format!("{:<24}", option.quality);
    let quality = if option.is_high_quality {
        quality.magenta().bold()
    } else if option.is_audio_only() {
        quality.cyan()
    } else {
        quality.normal()
    };

    format!(
        "  {} {:<6} {:>10}  {}",
        quality,
        option.extension(),
        format_bytes(option.estimated_size_bytes),
        streams
    )
}
