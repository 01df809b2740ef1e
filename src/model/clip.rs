use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::model::overlay::TextOverlaySpec;

/// Still-image duration used when an image is added without one.
pub const DEFAULT_STILL_DURATION: f64 = 5.0;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Classify by file extension (case-insensitive); anything not an image is a video.
    pub fn from_path(path: &Path) -> Self {
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(e))
            });
        if is_image { Self::Image } else { Self::Video }
    }
}

/// A media file plus the text overlays drawn on it.
///
/// Images always carry a positive still duration; videos never do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClipRecord", into = "ClipRecord")]
pub struct ClipEntry {
    path: PathBuf,
    kind: MediaKind,
    still_duration: Option<f64>,
    overlays: Vec<TextOverlaySpec>,
}

impl ClipEntry {
    /// Create an entry for `path`; images get [`DEFAULT_STILL_DURATION`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = MediaKind::from_path(&path);
        let still_duration = match kind {
            MediaKind::Image => Some(DEFAULT_STILL_DURATION),
            MediaKind::Video => None,
        };
        Self {
            path,
            kind,
            still_duration,
            overlays: Vec::new(),
        }
    }

    /// Create an image entry shown for `secs` seconds.
    pub fn image(path: impl Into<PathBuf>, secs: f64) -> ReelResult<Self> {
        let mut clip = Self::new(path);
        if clip.kind != MediaKind::Image {
            return Err(ReelError::validation(format!(
                "'{}' is not a still image",
                clip.path.display()
            )));
        }
        clip.set_still_duration(secs)?;
        Ok(clip)
    }

    pub fn with_overlay(mut self, overlay: TextOverlaySpec) -> Self {
        self.overlays.push(overlay);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    /// Display duration for images; `None` for videos.
    pub fn still_duration(&self) -> Option<f64> {
        self.still_duration
    }

    /// Set the display duration of an image. Ignored for videos.
    pub fn set_still_duration(&mut self, secs: f64) -> ReelResult<()> {
        if self.kind == MediaKind::Video {
            tracing::debug!(path = %self.path.display(), "still duration ignored for video clip");
            return Ok(());
        }
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ReelError::validation(format!(
                "image duration must be > 0, got {secs}"
            )));
        }
        self.still_duration = Some(secs);
        Ok(())
    }

    /// Overlays in stacking order (first is drawn lowest).
    pub fn overlays(&self) -> &[TextOverlaySpec] {
        &self.overlays
    }

    pub fn overlay_mut(&mut self, index: usize) -> Option<&mut TextOverlaySpec> {
        self.overlays.get_mut(index)
    }

    pub fn push_overlay(&mut self, overlay: TextOverlaySpec) -> ReelResult<()> {
        overlay.validate()?;
        self.overlays.push(overlay);
        Ok(())
    }

    pub fn insert_overlay(&mut self, index: usize, overlay: TextOverlaySpec) -> ReelResult<()> {
        if index > self.overlays.len() {
            return Err(ReelError::validation(format!(
                "overlay index {index} out of range (len {})",
                self.overlays.len()
            )));
        }
        overlay.validate()?;
        self.overlays.insert(index, overlay);
        Ok(())
    }

    pub fn remove_overlay(&mut self, index: usize) -> ReelResult<TextOverlaySpec> {
        if index >= self.overlays.len() {
            return Err(ReelError::validation(format!(
                "overlay index {index} out of range (len {})",
                self.overlays.len()
            )));
        }
        Ok(self.overlays.remove(index))
    }

    /// Move one overlay a step down the stack. Returns its new index.
    pub fn move_overlay_up(&mut self, index: usize) -> usize {
        if index > 0 && index < self.overlays.len() {
            self.overlays.swap(index - 1, index);
            index - 1
        } else {
            index
        }
    }

    /// Move one overlay a step up the stack. Returns its new index.
    pub fn move_overlay_down(&mut self, index: usize) -> usize {
        if index + 1 < self.overlays.len() {
            self.overlays.swap(index, index + 1);
            index + 1
        } else {
            index
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        match (self.kind, self.still_duration) {
            (MediaKind::Image, Some(d)) if d.is_finite() && d > 0.0 => {}
            (MediaKind::Image, _) => {
                return Err(ReelError::validation(format!(
                    "image clip '{}' needs a positive duration",
                    self.path.display()
                )));
            }
            (MediaKind::Video, _) => {}
        }
        for overlay in &self.overlays {
            overlay.validate()?;
        }
        Ok(())
    }

    pub fn has_placeholders(&self) -> bool {
        self.overlays.iter().any(TextOverlaySpec::has_placeholder)
    }
}

/// On-disk shape: `{ path, is_image, image_duration, texts }`.
#[derive(Serialize, Deserialize)]
struct ClipRecord {
    path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_image: Option<bool>,
    #[serde(default)]
    image_duration: Option<f64>,
    #[serde(default)]
    texts: Vec<TextOverlaySpec>,
}

impl From<ClipEntry> for ClipRecord {
    fn from(c: ClipEntry) -> Self {
        Self {
            is_image: Some(c.kind == MediaKind::Image),
            path: c.path,
            image_duration: c.still_duration,
            texts: c.overlays,
        }
    }
}

impl TryFrom<ClipRecord> for ClipEntry {
    type Error = ReelError;

    fn try_from(r: ClipRecord) -> ReelResult<Self> {
        if r.path.as_os_str().is_empty() {
            return Err(ReelError::validation("clip path must not be empty"));
        }
        // The extension decides the kind; the stored `is_image` flag is informational.
        let mut clip = Self::new(r.path);
        if let Some(secs) = r.image_duration {
            clip.set_still_duration(secs)?;
        }
        clip.overlays = r.texts;
        clip.validate()?;
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/b.PNG")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("b.jpeg")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("b.mp4")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("noext")), MediaKind::Video);
    }

    #[test]
    fn images_always_have_a_positive_duration() {
        let c = ClipEntry::new("logo.png");
        assert_eq!(c.still_duration(), Some(DEFAULT_STILL_DURATION));
        assert!(ClipEntry::image("logo.png", 0.0).is_err());
        assert!(ClipEntry::image("intro.mp4", 2.0).is_err());

        let mut c = ClipEntry::image("logo.png", 2.5).unwrap();
        assert!(c.set_still_duration(-1.0).is_err());
        assert_eq!(c.still_duration(), Some(2.5));
    }

    #[test]
    fn videos_ignore_still_duration() {
        let mut c = ClipEntry::new("intro.mp4");
        c.set_still_duration(3.0).unwrap();
        assert_eq!(c.still_duration(), None);
    }

    #[test]
    fn overlay_edits_keep_order() {
        let mut c = ClipEntry::new("intro.mp4");
        c.push_overlay(TextOverlaySpec::new("a")).unwrap();
        c.push_overlay(TextOverlaySpec::new("b")).unwrap();
        c.insert_overlay(0, TextOverlaySpec::new("c")).unwrap();
        let texts: Vec<_> = c.overlays().iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, ["c", "a", "b"]);

        assert_eq!(c.move_overlay_down(0), 1);
        assert_eq!(c.move_overlay_up(0), 0);
        assert_eq!(c.move_overlay_down(2), 2);
        assert_eq!(c.remove_overlay(1).unwrap().text, "c");
        assert!(c.remove_overlay(5).is_err());
        assert!(
            c.push_overlay(TextOverlaySpec::new("x").with_opacity(2.0))
                .is_err()
        );
    }

    #[test]
    fn record_round_trip_uses_legacy_field_names() {
        let c = ClipEntry::image("still.jpg", 4.0)
            .unwrap()
            .with_overlay(TextOverlaySpec::new("{OPIS}"));
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["path"], json!("still.jpg"));
        assert_eq!(v["is_image"], json!(true));
        assert_eq!(v["image_duration"], json!(4.0));
        assert_eq!(v["texts"][0]["text"], json!("{OPIS}"));

        let back: ClipEntry = serde_json::from_value(v).unwrap();
        assert_eq!(back, c);
        assert!(back.has_placeholders());
    }

    #[test]
    fn record_without_image_duration_gets_default() {
        let c: ClipEntry = serde_json::from_value(json!({"path": "p.png", "texts": []})).unwrap();
        assert_eq!(c.still_duration(), Some(DEFAULT_STILL_DURATION));

        let bad = json!({"path": "p.png", "image_duration": 0});
        assert!(serde_json::from_value::<ClipEntry>(bad).is_err());
    }
}
