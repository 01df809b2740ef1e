use std::path::Path;
use std::process::Command;

use crate::foundation::core::FrameSize;
use crate::foundation::error::{ReelError, ReelResult};

/// What the pipeline needs to know about a source file.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    pub size: FrameSize,
    /// Seconds; `0.0` when unknown.
    pub duration: f64,
    pub has_audio: bool,
}

/// Probe a video file with `ffprobe`.
pub fn probe_video(ffprobe: &Path, source_path: &Path) -> ReelResult<MediaInfo> {
    let out = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| {
            ReelError::media(format!(
                "failed to run ffprobe '{}': {e}",
                ffprobe.display()
            ))
        })?;
    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_ffprobe_json(&out.stdout)
        .map_err(|e| ReelError::media(format!("{}: {e}", source_path.display())))
}

pub(crate) fn parse_ffprobe_json(bytes: &[u8]) -> Result<MediaInfo, String> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut =
        serde_json::from_slice(bytes).map_err(|e| format!("ffprobe json parse failed: {e}"))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or("no video stream found")?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err("missing video width/height from ffprobe".to_owned());
    };
    let size = FrameSize::new(width, height).map_err(|e| e.to_string())?;

    let parse = |s: Option<&String>| s.and_then(|v| v.parse::<f64>().ok());
    let duration = parse(parsed.format.as_ref().and_then(|f| f.duration.as_ref()))
        .or_else(|| parse(video.duration.as_ref()))
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        size,
        duration,
        has_audio,
    })
}

/// Size a still image from its header; the image is shown for `duration` seconds.
pub fn probe_image(source_path: &Path, duration: f64) -> ReelResult<MediaInfo> {
    let (width, height) = image::image_dimensions(source_path).map_err(|e| {
        ReelError::media(format!(
            "failed to read image '{}': {e}",
            source_path.display()
        ))
    })?;
    Ok(MediaInfo {
        size: FrameSize::new(width, height)?,
        duration,
        has_audio: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_size_duration_and_audio() {
        let json = br#"{
            "streams": [
                { "codec_type": "video", "width": 1280, "height": 720, "duration": "3.9" },
                { "codec_type": "audio" }
            ],
            "format": { "duration": "4.000000" }
        }"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(info.size, FrameSize::new(1280, 720).unwrap());
        assert!((info.duration - 4.0).abs() < 1e-9);
        assert!(info.has_audio);
    }

    #[test]
    fn falls_back_to_stream_duration_and_flags_missing_video() {
        let json = br#"{ "streams": [ { "codec_type": "video", "width": 4, "height": 2, "duration": "1.5" } ] }"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert!((info.duration - 1.5).abs() < 1e-9);
        assert!(!info.has_audio);

        let audio_only = br#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        assert!(parse_ffprobe_json(audio_only).is_err());
        assert!(parse_ffprobe_json(b"not json").is_err());
    }

    #[test]
    fn image_dimensions_come_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        image::RgbImage::new(6, 4).save(&path).unwrap();
        let info = probe_image(&path, 2.0).unwrap();
        assert_eq!(info.size, FrameSize::new(6, 4).unwrap());
        assert_eq!(info.duration, 2.0);
        assert!(probe_image(&dir.path().join("missing.png"), 2.0).is_err());
    }
}
