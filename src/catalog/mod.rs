//! Rendition catalog: dedup, ranking and size estimation

pub mod builder;
pub mod estimate;
pub mod option;

pub use builder::build_catalog;
pub use estimate::{estimate_video_bytes, parse_resolution, AUDIO_DEFAULT_BYTES};
pub use option::{RenditionOption, StreamRefs, AUDIO_ONLY_LABEL};
