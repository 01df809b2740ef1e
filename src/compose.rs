//! Turning overlay specs into renderable layers.

pub mod layer;
pub mod motion;
pub mod wrap;

pub use layer::{BACKGROUND_PADDING, Background, OverlayLayer, build_layer};
pub use motion::{Motion, StaticAnchor};
pub use wrap::wrap_text;
