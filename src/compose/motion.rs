//! Analytic overlay positions.
//!
//! Every variant is evaluated with the final frame size and the text box size passed in, so no
//! position depends on pipeline state captured before the canonical size is known.

use std::f64::consts::TAU;

use crate::foundation::core::{Point, Size};
use crate::model::overlay::{Alignment, HorizontalAnchor, Position, VerticalAnchor};

pub const BOUNCE_PERIOD: f64 = 2.0;
pub const BOUNCE_AMPLITUDE: f64 = 30.0;
pub const BOUNCE_BASELINE: f64 = 50.0;

pub const FLOAT_PERIOD: f64 = 3.0;
pub const FLOAT_AMPLITUDE: f64 = 50.0;
pub const FLOAT_BASELINE: f64 = 100.0;

/// Slide starts this far left of the frame's left edge.
pub const SLIDE_LEAD_IN: f64 = 100.0;

/// Resolved placement of a static overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StaticAnchor {
    /// Fractional point of the frame; the text box is offset according to `alignment`.
    Fraction { x: f64, y: f64, alignment: Alignment },
    /// Literal top-left corner in pixels.
    Pixels { x: f64, y: f64 },
    Keyword {
        horizontal: HorizontalAnchor,
        vertical: VerticalAnchor,
    },
}

impl StaticAnchor {
    pub fn new(position: Position, alignment: Alignment) -> Self {
        match position {
            Position::Fraction { x, y } => Self::Fraction { x, y, alignment },
            Position::Pixels { x, y } => Self::Pixels { x, y },
            Position::Keyword {
                horizontal,
                vertical,
            } => Self::Keyword {
                horizontal,
                vertical,
            },
        }
    }
}

/// How a layer's top-left corner moves over elapsed time `t` (seconds since the layer started).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Static(StaticAnchor),
    /// Horizontally centered, vertical triangle wave.
    Bounce,
    /// Left to right across the frame width over `duration` seconds, vertically centered.
    Slide { duration: f64 },
    /// Horizontally centered, vertical sine wave.
    Float,
}

impl Motion {
    /// Top-left corner of a `text_box` inside a `frame` after `t` seconds.
    pub fn position_at(&self, t: f64, frame: Size, text_box: Size) -> Point {
        let centered_x = (frame.width - text_box.width) / 2.0;
        let centered_y = (frame.height - text_box.height) / 2.0;

        match *self {
            Self::Static(anchor) => static_position(anchor, frame, text_box),
            Self::Bounce => Point::new(centered_x, bounce_y(t)),
            Self::Slide { duration } => Point::new(slide_x(t, duration, frame.width), centered_y),
            Self::Float => Point::new(centered_x, float_y(t)),
        }
    }
}

fn static_position(anchor: StaticAnchor, frame: Size, text_box: Size) -> Point {
    match anchor {
        StaticAnchor::Fraction { x, y, alignment } => {
            let px = x * frame.width;
            let py = y * frame.height - text_box.height / 2.0;
            let px = match alignment {
                Alignment::Left => px,
                Alignment::Center => px - text_box.width / 2.0,
                Alignment::Right => px - text_box.width,
            };
            Point::new(px, py)
        }
        StaticAnchor::Pixels { x, y } => Point::new(x, y),
        StaticAnchor::Keyword {
            horizontal,
            vertical,
        } => {
            let x = match horizontal {
                HorizontalAnchor::Left => 0.0,
                HorizontalAnchor::Center => (frame.width - text_box.width) / 2.0,
                HorizontalAnchor::Right => frame.width - text_box.width,
            };
            let y = match vertical {
                VerticalAnchor::Top => 0.0,
                VerticalAnchor::Center => (frame.height - text_box.height) / 2.0,
                VerticalAnchor::Bottom => frame.height - text_box.height,
            };
            Point::new(x, y)
        }
    }
}

pub(crate) fn bounce_y(t: f64) -> f64 {
    BOUNCE_BASELINE + BOUNCE_AMPLITUDE * (2.0 * t.rem_euclid(BOUNCE_PERIOD) - 1.0).abs()
}

pub(crate) fn float_y(t: f64) -> f64 {
    FLOAT_BASELINE + FLOAT_AMPLITUDE * (TAU * t / FLOAT_PERIOD).sin()
}

pub(crate) fn slide_x(t: f64, duration: f64, frame_width: f64) -> f64 {
    if duration <= 0.0 {
        return -SLIDE_LEAD_IN;
    }
    (t / duration) * frame_width - SLIDE_LEAD_IN
}
