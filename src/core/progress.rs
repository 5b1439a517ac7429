//! Progress tracking for file downloads

use crate::utils::format::format_bytes;
use std::time::{Duration, Instant};

/// Progress information for a download
#[derive(Debug, Clone)]
pub struct Progress {
    /// Total size of the body in bytes, unknown for muxed output
    pub total_size: Option<u64>,
    /// Number of bytes written
    pub downloaded_size: u64,
    /// Current download speed in bytes per second
    pub speed: Option<f64>,
    /// Estimated time remaining
    pub eta: Option<Duration>,
    /// Time when download started
    pub start_time: Instant,
}

impl Progress {
    /// Create a new progress tracker
    pub fn new(total_size: Option<u64>) -> Self {
        Self {
            total_size: total_size.filter(|&t| t > 0),
            downloaded_size: 0,
            speed: None,
            eta: None,
            start_time: Instant::now(),
        }
    }

    /// Record that `bytes` more have been written
    pub fn advance(&mut self, bytes: u64) {
        self.update(self.downloaded_size + bytes);
    }

    /// Update progress with new downloaded size
    pub fn update(&mut self, downloaded_size: u64) {
        self.downloaded_size = downloaded_size;

        let elapsed = self.start_time.elapsed();
        if elapsed.as_millis() == 0 {
            return;
        }
        let speed = downloaded_size as f64 / elapsed.as_secs_f64();
        self.speed = Some(speed);

        if let Some(total) = self.total_size {
            if speed > 0.0 && total > downloaded_size {
                let remaining_bytes = total - downloaded_size;
                self.eta = Some(Duration::from_secs((remaining_bytes as f64 / speed) as u64));
            } else {
                self.eta = None;
            }
        }
    }

    /// Percentage complete, when the total is known
    pub fn percent(&self) -> Option<f64> {
        self.total_size
            .map(|total| (self.downloaded_size as f64 / total as f64 * 100.0).min(100.0))
    }

    /// Check if download is complete
    pub fn is_complete(&self) -> bool {
        self.total_size
            .map_or(false, |total| self.downloaded_size >= total)
    }

    /// Get human-readable speed string
    pub fn speed_string(&self) -> String {
        match self.speed {
            Some(speed) => format!("{}/s", format_bytes(speed as u64)),
            None => "Unknown".to_string(),
        }
    }

    /// Get human-readable downloaded size string
    pub fn downloaded_size_string(&self) -> String {
        format_bytes(self.downloaded_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_progress_creation() {
        let progress = Progress::new(Some(1000));
        assert_eq!(progress.total_size, Some(1000));
        assert_eq!(progress.downloaded_size, 0);
        assert_eq!(progress.percent(), Some(0.0));
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_update() {
        let mut progress = Progress::new(Some(1000));

        progress.advance(500);
        assert_eq!(progress.downloaded_size, 500);
        assert_eq!(progress.percent(), Some(50.0));
        assert!(!progress.is_complete());

        progress.advance(500);
        assert_eq!(progress.percent(), Some(100.0));
        assert!(progress.is_complete());
    }

    #[test]
    fn test_unknown_total() {
        let mut progress = Progress::new(None);
        progress.advance(4096);
        assert_eq!(progress.percent(), None);
        assert!(!progress.is_complete());
        assert_eq!(progress.downloaded_size_string(), "4.0 KB");
        assert_eq!(Progress::new(Some(0)).total_size, None);
    }

    #[test]
    fn test_progress_speed_calculation() {
        let mut progress = Progress::new(Some(1000));

        thread::sleep(Duration::from_millis(100));
        progress.update(100);

        assert!(progress.speed.unwrap() > 0.0);
        assert!(progress.eta.is_some());
        assert!(progress.speed_string().ends_with("/s"));
    }
}
