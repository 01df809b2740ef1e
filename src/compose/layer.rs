use crate::assets::color::{is_none_sentinel, parse_color};
use crate::compose::motion::{Motion, StaticAnchor};
use crate::compose::wrap::wrap_text;
use crate::foundation::core::Rgb8;
use crate::model::overlay::{Movement, TextOverlaySpec};

/// Padding on each side of the text inside a background box.
pub const BACKGROUND_PADDING: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Background {
    pub color: Rgb8,
    pub opacity: f64,
}

/// A text layer ready for compositing onto one clip.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayer {
    /// Final text, placeholders resolved and wrapping applied.
    pub content: String,
    pub font_size: u32,
    pub font: String,
    pub color: Rgb8,
    pub opacity: f64,
    /// Seconds from clip start.
    pub start: f64,
    /// Visible seconds, never past the end of the clip.
    pub duration: f64,
    pub motion: Motion,
    pub background: Option<Background>,
}

impl OverlayLayer {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Build the layer for one overlay of a clip lasting `clip_duration` seconds.
///
/// Returns `None` when the overlay would not be visible: it starts at or after the clip's end, or
/// its text is empty. Color problems never drop the layer: an unusable text color falls back to
/// white and an unusable background color removes only the background.
pub fn build_layer(
    resolved_text: &str,
    spec: &TextOverlaySpec,
    clip_duration: f64,
) -> Option<OverlayLayer> {
    let text = resolved_text.trim();
    if text.is_empty() {
        return None;
    }
    if !spec.is_visible_within(clip_duration) {
        tracing::debug!(
            start = spec.start_time,
            clip_duration,
            "overlay starts after the clip ends, skipped"
        );
        return None;
    }

    let full_duration = spec.effective_duration(clip_duration);
    let duration = full_duration.min(clip_duration - spec.start_time);
    if duration <= 0.0 {
        return None;
    }

    let motion = match spec.movement {
        Movement::Static => Motion::Static(StaticAnchor::new(spec.position, spec.alignment)),
        Movement::Bounce => Motion::Bounce,
        Movement::Slide => Motion::Slide {
            duration: full_duration,
        },
        Movement::Float => Motion::Float,
    };

    let color = parse_color(&spec.color).unwrap_or_else(|e| {
        tracing::warn!(color = %spec.color, error = %e, "invalid text color, using white");
        Rgb8::WHITE
    });

    let background = spec
        .background_color
        .as_deref()
        .filter(|c| !is_none_sentinel(c))
        .and_then(|c| match parse_color(c) {
            Ok(color) => Some(Background {
                color,
                opacity: spec.background_opacity,
            }),
            Err(e) => {
                tracing::warn!(color = %c, error = %e, "invalid background color, background skipped");
                None
            }
        });

    let content = match spec.wrap_width {
        Some(w) => wrap_text(text, w, spec.font_size),
        None => text.to_owned(),
    };

    Some(OverlayLayer {
        content,
        font_size: spec.font_size,
        font: spec.font.clone(),
        color,
        opacity: spec.opacity,
        start: spec.start_time,
        duration,
        motion,
        background,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_starting_after_clip_end_yields_no_layer() {
        for movement in [
            Movement::Static,
            Movement::Bounce,
            Movement::Slide,
            Movement::Float,
        ] {
            let spec = TextOverlaySpec::new("late")
                .with_movement(movement)
                .with_timing(5.5, Some(1.0));
            assert!(build_layer("late", &spec, 5.0).is_none(), "{movement:?}");
        }
    }

    #[test]
    fn zero_duration_means_until_clip_end() {
        let spec = TextOverlaySpec::new("x").with_timing(1.0, Some(0.0));
        let layer = build_layer("x", &spec, 4.0).unwrap();
        assert_eq!(layer.start, 1.0);
        assert_eq!(layer.duration, 3.0);
        assert_eq!(layer.end(), 4.0);
    }

    #[test]
    fn duration_is_clamped_to_clip_end() {
        let spec = TextOverlaySpec::new("x").with_timing(3.0, Some(10.0));
        let layer = build_layer("x", &spec, 4.0).unwrap();
        assert_eq!(layer.duration, 1.0);
    }

    #[test]
    fn slide_speed_uses_the_unclamped_duration() {
        let spec = TextOverlaySpec::new("x")
            .with_movement(Movement::Slide)
            .with_timing(0.0, Some(8.0));
        let layer = build_layer("x", &spec, 4.0).unwrap();
        assert_eq!(layer.motion, Motion::Slide { duration: 8.0 });
    }

    #[test]
    fn malformed_background_is_dropped_but_layer_kept() {
        let spec = TextOverlaySpec::new("x").with_background("#12zz45", 0.5);
        let layer = build_layer("x", &spec, 4.0).unwrap();
        assert!(layer.background.is_none());

        let spec = TextOverlaySpec::new("x").with_background("none", 0.5);
        assert!(build_layer("x", &spec, 4.0).unwrap().background.is_none());

        let spec = TextOverlaySpec::new("x").with_background("#102030", 0.5);
        let layer = build_layer("x", &spec, 4.0).unwrap();
        assert_eq!(
            layer.background,
            Some(Background {
                color: Rgb8::new(0x10, 0x20, 0x30),
                opacity: 0.5
            })
        );
    }

    #[test]
    fn bad_text_color_falls_back_to_white() {
        let spec = TextOverlaySpec::new("x").with_color("#nothex");
        assert_eq!(build_layer("x", &spec, 4.0).unwrap().color, Rgb8::WHITE);
    }

    #[test]
    fn empty_text_yields_no_layer() {
        let spec = TextOverlaySpec::new("   ");
        assert!(build_layer("   ", &spec, 4.0).is_none());
    }

    #[test]
    fn wrap_width_produces_multiple_lines() {
        let spec = TextOverlaySpec::new("x")
            .with_font_size(20)
            .with_wrap_width(110);
        let layer = build_layer("the quick brown fox jumps", &spec, 5.0).unwrap();
        assert_eq!(layer.content.lines().count(), 3);
    }
}
