//! [`MediaBackend`] backed by the system `ffmpeg`/`ffprobe` binaries.
//!
//! Every composed clip is encoded to an intermediate file in a per-backend scratch directory;
//! concatenation writes a concat-demuxer list over those files and the final encode reads it.

use std::ffi::OsString;
use std::io::{BufRead as _, BufReader, Read as _};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::compose::layer::OverlayLayer;
use crate::config::{EncodeSettings, MediaToolsConfig};
use crate::foundation::core::{FrameSize, fmt_secs};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::backend::{LoadedMedia, MediaBackend};
use crate::media::filter::{drawtext, video_chain};
use crate::media::probe::{probe_image, probe_video};
use crate::media::progress::ProgressState;
use crate::model::clip::{ClipEntry, MediaKind};

const INTERMEDIATE_SAMPLE_RATE: u32 = 44_100;

pub fn is_ffmpeg_on_path() -> bool {
    tool_runs(Path::new("ffmpeg")) && tool_runs(Path::new("ffprobe"))
}

fn tool_runs(tool: &Path) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Scratch directory removed with everything in it on drop.
#[derive(Debug)]
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn create(parent: Option<&Path>) -> ReelResult<Self> {
        let base = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let dir = base.join(format!(
            "reelmerge_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&dir).map_err(|e| {
            ReelError::media(format!(
                "failed to create scratch directory '{}': {e}",
                dir.display()
            ))
        })?;
        Ok(Self(dir))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Handle to a source file, an intermediate, or a concatenated sequence.
#[derive(Debug)]
pub enum FfmpegClip {
    Source {
        path: PathBuf,
        kind: MediaKind,
        duration: f64,
        has_audio: bool,
    },
    Composed {
        path: PathBuf,
        duration: f64,
        /// Text files referenced by drawtext filters.
        text_files: Vec<PathBuf>,
    },
    Sequence {
        list: PathBuf,
        duration: f64,
    },
}

impl FfmpegClip {
    pub fn duration(&self) -> f64 {
        match self {
            Self::Source { duration, .. }
            | Self::Composed { duration, .. }
            | Self::Sequence { duration, .. } => *duration,
        }
    }
}

pub struct FfmpegBackend {
    tools: MediaToolsConfig,
    fps: u32,
    scratch: ScratchDir,
    next_id: u64,
}

impl FfmpegBackend {
    /// Create a backend with its own scratch directory. Intermediates are produced at `fps`.
    pub fn new(tools: MediaToolsConfig, fps: u32) -> ReelResult<Self> {
        if fps == 0 {
            return Err(ReelError::validation("intermediate fps must be non-zero"));
        }
        if !tool_runs(&tools.ffmpeg) {
            return Err(ReelError::media(format!(
                "ffmpeg is required but '{}' could not be run",
                tools.ffmpeg.display()
            )));
        }
        let scratch = ScratchDir::create(tools.scratch_dir.as_deref())?;
        tracing::debug!(dir = %scratch.0.display(), "ffmpeg scratch directory created");
        Ok(Self {
            tools,
            fps,
            scratch,
            next_id: 0,
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch.0
    }

    fn scratch_path(&mut self, stem: &str, ext: &str) -> PathBuf {
        self.next_id += 1;
        self.scratch.0.join(format!("{stem}_{:04}.{ext}", self.next_id))
    }

    fn run(&self, args: &[OsString]) -> ReelResult<()> {
        tracing::debug!(args = ?args, "running ffmpeg");
        let out = Command::new(&self.tools.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ReelError::media(format!("failed to start ffmpeg: {e}")))?;
        if !out.status.success() {
            return Err(ReelError::media(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl MediaBackend for FfmpegBackend {
    type Clip = FfmpegClip;

    fn load(&mut self, entry: &ClipEntry) -> ReelResult<LoadedMedia<FfmpegClip>> {
        let path = entry.path().to_path_buf();
        let info = match entry.kind() {
            MediaKind::Image => {
                let secs = entry.still_duration().ok_or_else(|| {
                    ReelError::validation(format!(
                        "image clip '{}' has no duration",
                        path.display()
                    ))
                })?;
                probe_image(&path, secs)?
            }
            MediaKind::Video => {
                let info = probe_video(&self.tools.ffprobe, &path)?;
                if info.duration <= 0.0 {
                    return Err(ReelError::media(format!(
                        "could not determine duration of '{}'",
                        path.display()
                    )));
                }
                info
            }
        };
        Ok(LoadedMedia {
            clip: FfmpegClip::Source {
                path,
                kind: entry.kind(),
                duration: info.duration,
                has_audio: info.has_audio,
            },
            size: info.size,
            duration: info.duration,
        })
    }

    fn compose(
        &mut self,
        base: &FfmpegClip,
        canonical: FrameSize,
        layers: &[OverlayLayer],
    ) -> ReelResult<FfmpegClip> {
        let FfmpegClip::Source {
            path: src,
            kind,
            duration,
            has_audio,
        } = base
        else {
            return Err(ReelError::media("only source clips can be composed"));
        };

        let mut text_files = Vec::with_capacity(layers.len());
        let mut drawtexts = Vec::with_capacity(layers.len());
        for layer in layers {
            let textfile = self.scratch_path("layer", "txt");
            if let Err(e) = std::fs::write(&textfile, &layer.content) {
                remove_all(&text_files);
                return Err(ReelError::media(format!(
                    "failed to write overlay text '{}': {e}",
                    textfile.display()
                )));
            }
            drawtexts.push(drawtext(layer, &textfile));
            text_files.push(textfile);
        }

        let out = self.scratch_path("clip", "mp4");
        let secs = fmt_secs(*duration);
        let silence = format!(
            "anullsrc=channel_layout=stereo:sample_rate={INTERMEDIATE_SAMPLE_RATE}"
        );

        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
            .map(OsString::from)
            .into();
        if *kind == MediaKind::Image {
            args.extend(["-loop", "1", "-t", &secs].map(OsString::from));
        }
        args.push("-i".into());
        args.push(src.into());
        if !has_audio {
            args.extend(["-f", "lavfi", "-t", &secs, "-i", &silence].map(OsString::from));
        }
        let audio_map = if *has_audio { "0:a:0" } else { "1:a:0" };
        args.extend(
            [
                "-map",
                "0:v:0",
                "-map",
                audio_map,
                "-filter:v",
                &video_chain(canonical, self.fps, &drawtexts),
                "-t",
                &secs,
                "-c:v",
                "libx264",
                "-preset",
                "ultrafast",
                "-c:a",
                "aac",
                "-ar",
                &INTERMEDIATE_SAMPLE_RATE.to_string(),
                "-ac",
                "2",
            ]
            .map(OsString::from),
        );
        args.push(out.clone().into());

        if let Err(e) = self.run(&args) {
            let _ = std::fs::remove_file(&out);
            remove_all(&text_files);
            return Err(e);
        }

        tracing::debug!(
            source = %src.display(),
            out = %out.display(),
            layers = layers.len(),
            "clip composed"
        );
        Ok(FfmpegClip::Composed {
            path: out,
            duration: *duration,
            text_files,
        })
    }

    fn concatenate(&mut self, clips: &[FfmpegClip], _size: FrameSize) -> ReelResult<FfmpegClip> {
        let mut list = String::new();
        let mut duration = 0.0;
        for clip in clips {
            let FfmpegClip::Composed { path, .. } = clip else {
                return Err(ReelError::media("only composed clips can be concatenated"));
            };
            let abs = std::path::absolute(path).map_err(|e| {
                ReelError::media(format!("failed to resolve '{}': {e}", path.display()))
            })?;
            list.push_str(&concat_list_entry(&abs));
            duration += clip.duration();
        }

        let list_path = self.scratch_path("concat", "txt");
        std::fs::write(&list_path, list).map_err(|e| {
            ReelError::media(format!(
                "failed to write concat list '{}': {e}",
                list_path.display()
            ))
        })?;
        Ok(FfmpegClip::Sequence {
            list: list_path,
            duration,
        })
    }

    fn encode(
        &mut self,
        sequence: &FfmpegClip,
        output: &Path,
        settings: &EncodeSettings,
        progress: &mut dyn FnMut(u8),
    ) -> ReelResult<()> {
        let FfmpegClip::Sequence { list, duration } = sequence else {
            return Err(ReelError::media("only concatenated sequences can be encoded"));
        };
        settings.validate()?;
        ensure_parent_dir(output)?;

        let mut cmd = Command::new(&self.tools.ffmpeg);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list)
            .args([
                "-r",
                &settings.fps.to_string(),
                "-c:v",
                &settings.video_codec,
                "-preset",
                &settings.preset,
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                &settings.audio_codec,
                "-threads",
                &settings.threads.to_string(),
                "-movflags",
                "+faststart",
                "-progress",
                "pipe:1",
                "-nostats",
            ])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(cmd = ?cmd, "running ffmpeg encode");

        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::media(format!("failed to start ffmpeg: {e}")))?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::media("failed to capture ffmpeg output"));
        };

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut output = String::new();
            match BufReader::new(stderr).read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut state = ProgressState::default();
        let mut last_percent = None;
        let mut read_error = None;
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            };
            if state.feed_line(&line) {
                let pct = state.percent(*duration);
                if last_percent != Some(pct) {
                    last_percent = Some(pct);
                    progress(pct);
                }
            }
        }
        if read_error.is_some() {
            let _ = child.kill();
        }

        let status = child
            .wait()
            .map_err(|e| ReelError::media(format!("failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_owned());

        if let Some(e) = read_error {
            return Err(ReelError::media(format!(
                "failed reading ffmpeg progress: {e}"
            )));
        }
        if !status.success() {
            return Err(ReelError::media(format!(
                "ffmpeg encode failed (status {status}): {}",
                stderr_output.trim()
            )));
        }
        if last_percent != Some(100) {
            progress(100);
        }
        Ok(())
    }

    fn release(&mut self, clip: FfmpegClip) {
        match clip {
            FfmpegClip::Source { .. } => {}
            FfmpegClip::Composed {
                path, text_files, ..
            } => {
                let _ = std::fs::remove_file(path);
                remove_all(&text_files);
            }
            FfmpegClip::Sequence { list, .. } => {
                let _ = std::fs::remove_file(list);
            }
        }
    }
}

fn remove_all(paths: &[PathBuf]) {
    for p in paths {
        let _ = std::fs::remove_file(p);
    }
}

/// One line of a concat-demuxer list; single quotes in the path are escaped.
fn concat_list_entry(path: &Path) -> String {
    let quoted = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{quoted}'\n")
}
