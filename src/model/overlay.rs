use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::placeholder::resolver::contains_token;

pub const DEFAULT_FONT_SIZE: u32 = 50;
pub const DEFAULT_COLOR: &str = "white";
pub const DEFAULT_OPACITY: f64 = 0.8;
pub const DEFAULT_FONT: &str = "Arial-Bold";

/// How an overlay moves over the lifetime of its layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    #[default]
    Static,
    Bounce,
    Slide,
    Float,
}

/// Which point of the text box sits on a fractional position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Center,
    Bottom,
}

/// Where a static overlay is placed.
///
/// On disk this is a two-element array: two numbers (fractions when both are in `[0, 1]`,
/// otherwise literal pixels) or two keywords such as `["center", "bottom"]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// Fractions of the final frame width/height.
    Fraction { x: f64, y: f64 },
    /// Literal top-left pixel coordinates.
    Pixels { x: f64, y: f64 },
    /// Literal keyword anchor.
    Keyword {
        horizontal: HorizontalAnchor,
        vertical: VerticalAnchor,
    },
}

impl Position {
    pub const CENTERED: Self = Self::Keyword {
        horizontal: HorizontalAnchor::Center,
        vertical: VerticalAnchor::Center,
    };

    /// Classify a numeric pair: fractional when both values lie in `[0, 1]`.
    pub fn from_pair(x: f64, y: f64) -> Self {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if unit(x) && unit(y) {
            Self::Fraction { x, y }
        } else {
            Self::Pixels { x, y }
        }
    }

    fn from_keywords(h: &str, v: &str) -> Result<Self, String> {
        let horizontal = match h.trim().to_ascii_lowercase().as_str() {
            "left" => HorizontalAnchor::Left,
            "center" | "centre" => HorizontalAnchor::Center,
            "right" => HorizontalAnchor::Right,
            other => return Err(format!("unknown horizontal position keyword \"{other}\"")),
        };
        let vertical = match v.trim().to_ascii_lowercase().as_str() {
            "top" => VerticalAnchor::Top,
            "center" | "centre" => VerticalAnchor::Center,
            "bottom" => VerticalAnchor::Bottom,
            other => return Err(format!("unknown vertical position keyword \"{other}\"")),
        };
        Ok(Self::Keyword {
            horizontal,
            vertical,
        })
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::CENTERED
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple as _;

        let mut tup = serializer.serialize_tuple(2)?;
        match *self {
            Self::Fraction { x, y } | Self::Pixels { x, y } => {
                tup.serialize_element(&x)?;
                tup.serialize_element(&y)?;
            }
            Self::Keyword {
                horizontal,
                vertical,
            } => {
                let h = match horizontal {
                    HorizontalAnchor::Left => "left",
                    HorizontalAnchor::Center => "center",
                    HorizontalAnchor::Right => "right",
                };
                let v = match vertical {
                    VerticalAnchor::Top => "top",
                    VerticalAnchor::Center => "center",
                    VerticalAnchor::Bottom => "bottom",
                };
                tup.serialize_element(h)?;
                tup.serialize_element(v)?;
            }
        }
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Component {
            Num(f64),
            Word(String),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Pair(Component, Component),
            Word(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Pair(Component::Num(x), Component::Num(y)) => Ok(Self::from_pair(x, y)),
            Repr::Pair(Component::Word(h), Component::Word(v)) => {
                Self::from_keywords(&h, &v).map_err(serde::de::Error::custom)
            }
            Repr::Pair(_, _) => Err(serde::de::Error::custom(
                "position must be two numbers or two keywords",
            )),
            Repr::Word(w) => Self::from_keywords(&w, &w).map_err(serde::de::Error::custom),
        }
    }
}

/// Appearance, timing and motion of one text layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OverlayRecord", into = "OverlayRecord")]
pub struct TextOverlaySpec {
    /// Literal text, possibly containing `{TOKEN}` placeholders.
    pub text: String,
    pub font_size: u32,
    /// Color name or hex string.
    pub color: String,
    pub opacity: f64,
    pub font: String,
    pub movement: Movement,
    /// Only used for [`Movement::Static`].
    pub position: Position,
    pub alignment: Alignment,
    /// Seconds from the start of the containing clip.
    pub start_time: f64,
    /// Seconds; `None` or `0` means "until the clip ends".
    pub duration: Option<f64>,
    pub background_color: Option<String>,
    pub background_opacity: f64,
    /// Pixel width that forces multi-line layout.
    pub wrap_width: Option<u32>,
}

impl TextOverlaySpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR.to_owned(),
            opacity: DEFAULT_OPACITY,
            font: DEFAULT_FONT.to_owned(),
            movement: Movement::Static,
            position: Position::CENTERED,
            alignment: Alignment::Center,
            start_time: 0.0,
            duration: None,
            background_color: None,
            background_opacity: 1.0,
            wrap_width: None,
        }
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_timing(mut self, start_time: f64, duration: Option<f64>) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }

    pub fn with_background(mut self, color: impl Into<String>, opacity: f64) -> Self {
        self.background_color = Some(color.into());
        self.background_opacity = opacity;
        self
    }

    pub fn with_wrap_width(mut self, wrap_width: u32) -> Self {
        self.wrap_width = Some(wrap_width);
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.font_size == 0 {
            return Err(ReelError::validation("overlay font size must be > 0"));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(ReelError::validation(format!(
                "overlay opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(ReelError::validation(format!(
                "overlay start_time must be >= 0, got {}",
                self.start_time
            )));
        }
        if let Some(d) = self.duration
            && (!d.is_finite() || d < 0.0)
        {
            return Err(ReelError::validation(format!(
                "overlay duration must be >= 0, got {d}"
            )));
        }
        if self.wrap_width == Some(0) {
            return Err(ReelError::validation("overlay wrap_width must be > 0"));
        }
        if !self.background_opacity.is_finite() || !(0.0..=1.0).contains(&self.background_opacity)
        {
            return Err(ReelError::validation(format!(
                "overlay background_opacity must be within [0, 1], got {}",
                self.background_opacity
            )));
        }
        Ok(())
    }

    /// Layer duration inside a clip of `clip_duration` seconds.
    pub fn effective_duration(&self, clip_duration: f64) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => d,
            _ => clip_duration,
        }
    }

    /// `false` when the overlay starts after the clip ends.
    pub fn is_visible_within(&self, clip_duration: f64) -> bool {
        self.start_time <= clip_duration
    }

    pub fn has_placeholder(&self) -> bool {
        contains_token(&self.text)
    }
}

#[derive(Serialize, Deserialize)]
struct OverlayRecord {
    #[serde(default)]
    text: String,
    #[serde(default)]
    config: OverlayConfig,
}

#[derive(Serialize, Deserialize)]
struct OverlayConfig {
    #[serde(rename = "fontsize", alias = "font_size", default = "default_font_size")]
    font_size: u32,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default = "default_opacity")]
    opacity: f64,
    #[serde(default = "default_font")]
    font: String,
    #[serde(default)]
    movement: Movement,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    alignment: Alignment,
    #[serde(default)]
    start_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    #[serde(default = "one")]
    background_opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wrap_width: Option<u32>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        TextOverlaySpec::new("").into_record().config
    }
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_COLOR.to_owned()
}

fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

fn default_font() -> String {
    DEFAULT_FONT.to_owned()
}

fn one() -> f64 {
    1.0
}

impl TextOverlaySpec {
    fn into_record(self) -> OverlayRecord {
        OverlayRecord {
            text: self.text,
            config: OverlayConfig {
                font_size: self.font_size,
                color: self.color,
                opacity: self.opacity,
                font: self.font,
                movement: self.movement,
                position: self.position,
                alignment: self.alignment,
                start_time: self.start_time,
                duration: self.duration,
                background_color: self.background_color,
                background_opacity: self.background_opacity,
                wrap_width: self.wrap_width,
            },
        }
    }
}

impl From<TextOverlaySpec> for OverlayRecord {
    fn from(spec: TextOverlaySpec) -> Self {
        spec.into_record()
    }
}

impl TryFrom<OverlayRecord> for TextOverlaySpec {
    type Error = ReelError;

    fn try_from(r: OverlayRecord) -> ReelResult<Self> {
        let c = r.config;
        let spec = Self {
            text: r.text,
            font_size: c.font_size,
            color: c.color,
            opacity: c.opacity,
            font: c.font,
            movement: c.movement,
            position: c.position,
            alignment: c.alignment,
            start_time: c.start_time,
            duration: c.duration,
            background_color: c.background_color,
            background_opacity: c.background_opacity,
            wrap_width: c.wrap_width,
        };
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_editor_defaults() {
        let s = TextOverlaySpec::new("Hello");
        assert_eq!(s.font_size, 50);
        assert_eq!(s.color, "white");
        assert!((s.opacity - 0.8).abs() < 1e-12);
        assert_eq!(s.font, "Arial-Bold");
        assert_eq!(s.movement, Movement::Static);
        assert_eq!(s.position, Position::CENTERED);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn deserializes_nested_text_config_records() {
        let s: TextOverlaySpec = serde_json::from_value(json!({
            "text": "{NAZWA_PL}",
            "config": {
                "fontsize": 64,
                "color": "#ffcc00",
                "movement": "slide",
                "opacity": 0.5,
                "position": [0.25, 0.75],
                "start_time": 1.5,
                "duration": 0,
                "font": "DejaVu-Sans"
            }
        }))
        .unwrap();

        assert_eq!(s.text, "{NAZWA_PL}");
        assert_eq!(s.font_size, 64);
        assert_eq!(s.movement, Movement::Slide);
        assert_eq!(s.position, Position::Fraction { x: 0.25, y: 0.75 });
        assert_eq!(s.duration, Some(0.0));
        assert_eq!(s.effective_duration(7.0), 7.0);
        assert!(s.has_placeholder());
    }

    #[test]
    fn positions_classify_pairs_and_keywords() {
        let p: Position = serde_json::from_value(json!([160, 90])).unwrap();
        assert_eq!(p, Position::Pixels { x: 160.0, y: 90.0 });

        let p: Position = serde_json::from_value(json!(["center", "center"])).unwrap();
        assert_eq!(p, Position::CENTERED);

        let p: Position = serde_json::from_value(json!("center")).unwrap();
        assert_eq!(p, Position::CENTERED);

        let p: Position = serde_json::from_value(json!(["right", "bottom"])).unwrap();
        assert_eq!(
            p,
            Position::Keyword {
                horizontal: HorizontalAnchor::Right,
                vertical: VerticalAnchor::Bottom
            }
        );

        assert!(serde_json::from_value::<Position>(json!(["center", 4])).is_err());
        assert!(serde_json::from_value::<Position>(json!(["middle", "top"])).is_err());
    }

    #[test]
    fn invalid_configs_are_rejected_on_load() {
        let bad_opacity = json!({"text": "x", "config": {"opacity": 1.5}});
        assert!(serde_json::from_value::<TextOverlaySpec>(bad_opacity).is_err());

        let bad_size = json!({"text": "x", "config": {"fontsize": 0}});
        assert!(serde_json::from_value::<TextOverlaySpec>(bad_size).is_err());

        let bad_start = json!({"text": "x", "config": {"start_time": -1.0}});
        assert!(serde_json::from_value::<TextOverlaySpec>(bad_start).is_err());
    }

    #[test]
    fn serializes_back_to_the_same_spec() {
        let spec = TextOverlaySpec::new("Sale {INDEKS}")
            .with_font_size(72)
            .with_movement(Movement::Float)
            .with_position(Position::Fraction { x: 0.1, y: 0.9 })
            .with_alignment(Alignment::Left)
            .with_timing(2.0, Some(3.0))
            .with_background("#000000", 0.6)
            .with_wrap_width(800);

        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["config"]["fontsize"], json!(72));
        assert_eq!(v["config"]["position"], json!([0.1, 0.9]));
        let back: TextOverlaySpec = serde_json::from_value(v).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn visibility_depends_on_start_time() {
        let s = TextOverlaySpec::new("x").with_timing(6.0, None);
        assert!(!s.is_visible_within(5.0));
        assert!(s.is_visible_within(6.0));
    }
}
