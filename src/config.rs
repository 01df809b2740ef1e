//! Runtime configuration.
//!
//! Stored as JSON. Every section is optional; absent keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

pub const DEFAULT_FPS: u32 = 29;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub ffmpeg: MediaToolsConfig,
    pub encode: EncodeSettings,
    pub logging: LoggingConfig,
    /// Template file holding the pre/post clip lists.
    pub template_path: Option<PathBuf>,
    /// Catalog workbook used for placeholder lookups.
    pub catalog_path: Option<PathBuf>,
}

/// Locations of the external media tools.
///
/// Paths are handed to the backend explicitly; the process environment is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Parent of the per-render scratch directory. System temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for MediaToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            scratch_dir: None,
        }
    }
}

/// Final encode parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    /// Encoder threads.
    pub threads: usize,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            video_codec: "libx264".to_owned(),
            audio_codec: "aac".to_owned(),
            preset: "ultrafast".to_owned(),
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl EncodeSettings {
    pub fn validate(&self) -> ReelResult<()> {
        if self.fps == 0 {
            return Err(ReelError::validation("encode fps must be non-zero"));
        }
        if self.threads == 0 {
            return Err(ReelError::validation("encode threads must be >= 1"));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(ReelError::validation("encode codecs must be non-empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `"info"` or `"reelmerge=debug,warn"`. `RUST_LOG` wins when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl ReelConfig {
    /// Load from `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ReelError::validation(format!(
                    "failed to read config '{}': {e}",
                    path.display()
                )));
            }
        };
        let cfg: Self = serde_json::from_str(&content).map_err(|e| {
            ReelError::serde(format!("failed to parse config '{}': {e}", path.display()))
        })?;
        cfg.encode.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_defaults_match_the_delivery_format() {
        let e = EncodeSettings::default();
        assert_eq!(e.fps, 29);
        assert_eq!(e.video_codec, "libx264");
        assert_eq!(e.audio_codec, "aac");
        assert_eq!(e.preset, "ultrafast");
        assert!(e.threads >= 1);
        assert!(e.validate().is_ok());
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: ReelConfig = serde_json::from_str(
            r#"{ "ffmpeg": { "ffmpeg": "/opt/ff/bin/ffmpeg" }, "encode": { "fps": 25 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.ffmpeg.ffmpeg, PathBuf::from("/opt/ff/bin/ffmpeg"));
        assert_eq!(cfg.ffmpeg.ffprobe, PathBuf::from("ffprobe"));
        assert_eq!(cfg.encode.fps, 25);
        assert_eq!(cfg.encode.preset, "ultrafast");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.template_path.is_none());
    }

    #[test]
    fn missing_file_gives_defaults_and_bad_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(ReelConfig::load(&missing).unwrap(), ReelConfig::default());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(ReelConfig::load(&bad), Err(ReelError::Serde(_))));

        let zero_fps = dir.path().join("zero.json");
        std::fs::write(&zero_fps, r#"{ "encode": { "fps": 0 } }"#).unwrap();
        assert!(matches!(
            ReelConfig::load(&zero_fps),
            Err(ReelError::Validation(_))
        ));
    }
}
