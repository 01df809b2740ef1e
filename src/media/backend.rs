use std::path::Path;

use crate::compose::layer::OverlayLayer;
use crate::config::EncodeSettings;
use crate::foundation::core::FrameSize;
use crate::foundation::error::ReelResult;
use crate::model::clip::ClipEntry;

/// A clip handle returned by [`MediaBackend::load`] with the facts the pipeline needs.
#[derive(Debug)]
pub struct LoadedMedia<C> {
    pub clip: C,
    /// Native frame size of the source.
    pub size: FrameSize,
    /// Seconds. Images report their still duration.
    pub duration: f64,
}

/// The media engine the render pipeline drives.
///
/// Handles are opaque to the pipeline. Every handle obtained from `load`, `compose` or
/// `concatenate` is passed back to `release` exactly once.
pub trait MediaBackend {
    type Clip;

    /// Open the media behind `entry`. Images are given `entry.still_duration()`.
    fn load(&mut self, entry: &ClipEntry) -> ReelResult<LoadedMedia<Self::Clip>>;

    /// Fit `base` into `canonical` (scaled, letterboxed) and draw `layers` over it, in order.
    fn compose(
        &mut self,
        base: &Self::Clip,
        canonical: FrameSize,
        layers: &[OverlayLayer],
    ) -> ReelResult<Self::Clip>;

    /// Join composed clips end to end.
    fn concatenate(&mut self, clips: &[Self::Clip], size: FrameSize) -> ReelResult<Self::Clip>;

    /// Encode `sequence` into `output`, reporting whole percentages as they advance.
    fn encode(
        &mut self,
        sequence: &Self::Clip,
        output: &Path,
        settings: &EncodeSettings,
        progress: &mut dyn FnMut(u8),
    ) -> ReelResult<()>;

    fn release(&mut self, clip: Self::Clip);
}
