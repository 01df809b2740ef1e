//! Turning a timeline into one encoded video.

pub mod pipeline;
pub mod progress;
pub mod worker;

pub use pipeline::{
    CancelToken, RenderOptions, RenderOutcome, RenderPipeline, RenderReport, RenderStage,
    SkippedClip, render,
};
pub use progress::Progress;
pub use worker::{RenderEvent, RenderJob, RenderWorker};
