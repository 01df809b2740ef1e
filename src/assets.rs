pub mod color;

pub use color::{NONE_SENTINEL, is_none_sentinel, parse_color};
