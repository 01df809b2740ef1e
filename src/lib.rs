//! reelmerge assembles video clips and still images into one video, drawing timed and animated
//! text overlays on each clip.
//!
//! - Build a [`Timeline`] (template prefix, user clips, template suffix)
//! - Attach [`TextOverlaySpec`]s to clips; `{TOKEN}` placeholders resolve against an
//!   [`ItemDataSource`] at render time
//! - [`render`] it through a [`MediaBackend`] such as [`FfmpegBackend`], or run it on a
//!   [`RenderWorker`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod config;
pub mod foundation;
pub mod logging;
pub mod media;
pub mod model;
pub mod placeholder;
pub mod render;
pub mod template;

pub use crate::config::{EncodeSettings, LoggingConfig, MediaToolsConfig, ReelConfig};
pub use crate::foundation::core::{FrameSize, Point, Rgb8, Size};
pub use crate::foundation::error::{ReelError, ReelResult};
pub use crate::media::{FfmpegBackend, LoadedMedia, MediaBackend};
pub use crate::model::{
    Alignment, ClipEntry, MediaKind, Movement, Position, Section, TextOverlaySpec, Timeline,
};
pub use crate::placeholder::{
    CatalogSource, InMemorySource, ItemDataSource, LocalizedNames, NoDataSource,
    PlaceholderResolver,
};
pub use crate::render::{
    CancelToken, Progress, RenderEvent, RenderJob, RenderOptions, RenderOutcome, RenderReport,
    RenderStage, RenderWorker, SkippedClip, render,
};
pub use crate::template::{Template, TemplateStore};
