pub mod clip;
pub mod overlay;
pub mod timeline;

pub use clip::{ClipEntry, DEFAULT_STILL_DURATION, MediaKind};
pub use overlay::{
    Alignment, HorizontalAnchor, Movement, Position, TextOverlaySpec, VerticalAnchor,
};
pub use timeline::{Section, Timeline};
