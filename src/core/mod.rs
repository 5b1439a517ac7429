//! Core functionality for vidmux

pub mod downloader;
pub mod progress;
pub mod save;
pub mod summary;
pub mod video_info;

pub use downloader::*;
pub use progress::*;
pub use save::{resolve_output_path, save_transfer};
pub use summary::*;
pub use video_info::*;
