//! Media engine seam and its ffmpeg implementation.

pub mod backend;
pub mod ffmpeg;
pub mod filter;
pub mod probe;
pub mod progress;

pub use backend::{LoadedMedia, MediaBackend};
pub use ffmpeg::{FfmpegBackend, FfmpegClip, is_ffmpeg_on_path};
pub use probe::{MediaInfo, probe_image, probe_video};
