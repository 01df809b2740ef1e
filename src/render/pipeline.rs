use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compose::layer::{OverlayLayer, build_layer};
use crate::config::EncodeSettings;
use crate::foundation::core::FrameSize;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::backend::MediaBackend;
use crate::model::clip::ClipEntry;
use crate::model::timeline::Timeline;
use crate::placeholder::resolver::PlaceholderResolver;
use crate::placeholder::source::{ItemDataSource, NoDataSource};
use crate::render::progress::Progress;

/// Where a render currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStage {
    Idle,
    Validating,
    /// Index into the effective order.
    ProcessingClip(usize),
    Concatenating,
    Encoding,
    Done,
    Failed,
}

/// Shared cancellation flag, checked before each clip is processed.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A clip left out of the output.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedClip {
    /// Index into the effective order.
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    pub output_path: PathBuf,
    pub processed_count: usize,
    pub skipped: Vec<SkippedClip>,
    pub canonical_size: FrameSize,
}

/// Result of [`render`]: never an error, always a message for the operator.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutcome {
    pub success: bool,
    pub message: String,
    pub report: Option<RenderReport>,
}

impl RenderOutcome {
    pub fn from_result(result: ReelResult<RenderReport>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                message: format!(
                    "Video successfully created: {}",
                    report.output_path.display()
                ),
                report: Some(report),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                report: None,
            },
        }
    }
}

/// Per-render options.
pub struct RenderOptions<'a> {
    pub settings: EncodeSettings,
    /// Placeholder data.
    pub source: &'a dyn ItemDataSource,
    pub cancel: CancelToken,
}

impl Default for RenderOptions<'static> {
    fn default() -> Self {
        Self {
            settings: EncodeSettings::default(),
            source: &NoDataSource,
            cancel: CancelToken::new(),
        }
    }
}

/// Walks a [`Timeline`] once and produces one encoded file.
///
/// Stages: `Validating → ProcessingClip(i)… → Concatenating → Encoding → Done`, or `Failed`
/// from any of them. Clips that cannot be processed are skipped and reported; the render fails
/// only when nothing survives, the sequence cannot be joined or encoded, or it is cancelled.
pub struct RenderPipeline<'a, B: MediaBackend> {
    backend: &'a mut B,
    opts: RenderOptions<'a>,
    stage: RenderStage,
}

impl<'a, B: MediaBackend> RenderPipeline<'a, B> {
    pub fn new(backend: &'a mut B, opts: RenderOptions<'a>) -> Self {
        Self {
            backend,
            opts,
            stage: RenderStage::Idle,
        }
    }

    pub fn stage(&self) -> RenderStage {
        self.stage
    }

    fn enter(&mut self, stage: RenderStage) {
        tracing::debug!(?stage, "render stage");
        self.stage = stage;
    }

    pub fn run(
        &mut self,
        timeline: &Timeline,
        output_path: &Path,
        item_identifier: &str,
        progress: &mut dyn FnMut(Progress),
    ) -> ReelResult<RenderReport> {
        let result = self.run_stages(timeline, output_path, item_identifier, progress);
        match &result {
            Ok(report) => {
                self.enter(RenderStage::Done);
                tracing::info!(
                    output = %report.output_path.display(),
                    processed = report.processed_count,
                    skipped = report.skipped.len(),
                    size = %report.canonical_size,
                    "render finished"
                );
            }
            Err(e) => {
                self.enter(RenderStage::Failed);
                tracing::error!(error = %e, "render failed");
            }
        }
        result
    }

    fn run_stages(
        &mut self,
        timeline: &Timeline,
        output_path: &Path,
        item_identifier: &str,
        progress: &mut dyn FnMut(Progress),
    ) -> ReelResult<RenderReport> {
        self.enter(RenderStage::Validating);
        if output_path.as_os_str().is_empty() {
            return Err(ReelError::validation("output path must not be empty"));
        }
        self.opts.settings.validate()?;
        if timeline.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }

        let item = item_identifier.trim();
        if item.is_empty() && timeline.has_placeholders() {
            tracing::warn!("placeholders present but no item identifier given; they stay unresolved");
        }

        let clips = timeline.effective_order();
        let total = clips.len();
        tracing::info!(clips = total, item, "render started");

        let mut resolver = PlaceholderResolver::new(self.opts.source, item);
        let mut canonical: Option<FrameSize> = None;
        let mut processed: Vec<B::Clip> = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (index, entry) in clips.into_iter().enumerate() {
            if self.opts.cancel.is_cancelled() {
                tracing::info!(index, "render cancelled");
                self.release_all(processed);
                return Err(ReelError::Cancelled);
            }

            self.enter(RenderStage::ProcessingClip(index));
            progress(Progress::indeterminate(format!(
                "Processing clip {}/{total}: {}",
                index + 1,
                display_name(entry.path())
            )));

            if !entry.path().exists() {
                tracing::warn!(index, path = %entry.path().display(), "clip file not found, skipped");
                skipped.push(SkippedClip {
                    index,
                    path: entry.path().to_path_buf(),
                    reason: "file not found".to_owned(),
                });
                continue;
            }

            match self.process_clip(entry, &mut resolver, &mut canonical) {
                Ok(clip) => processed.push(clip),
                Err(e) => {
                    tracing::warn!(index, path = %entry.path().display(), error = %e, "clip skipped");
                    skipped.push(SkippedClip {
                        index,
                        path: entry.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let Some(canonical) = canonical.filter(|_| !processed.is_empty()) else {
            self.release_all(processed);
            return Err(ReelError::NothingProcessed { attempted: total });
        };

        self.enter(RenderStage::Concatenating);
        progress(Progress::indeterminate("Concatenating clips"));
        let sequence = match self.backend.concatenate(&processed, canonical) {
            Ok(s) => s,
            Err(e) => {
                self.release_all(processed);
                return Err(e);
            }
        };

        self.enter(RenderStage::Encoding);
        progress(Progress::indeterminate("Starting encode"));
        let partial = PartialOutput::new(output_path);
        let encoded = self.backend.encode(
            &sequence,
            partial.path(),
            &self.opts.settings,
            &mut |percent| progress(Progress::determinate(percent, "Encoding video")),
        );

        self.backend.release(sequence);
        let processed_count = processed.len();
        self.release_all(processed);

        encoded?;
        partial.commit(output_path)?;
        progress(Progress::determinate(100, "Done"));

        Ok(RenderReport {
            output_path: output_path.to_path_buf(),
            processed_count,
            skipped,
            canonical_size: canonical,
        })
    }

    fn process_clip(
        &mut self,
        entry: &ClipEntry,
        resolver: &mut PlaceholderResolver<'_>,
        canonical: &mut Option<FrameSize>,
    ) -> ReelResult<B::Clip> {
        let loaded = self.backend.load(entry)?;
        let size = *canonical.get_or_insert_with(|| {
            let size = loaded.size.to_even();
            tracing::info!(native = %loaded.size, canonical = %size, "canonical size fixed");
            size
        });

        let layers: Vec<OverlayLayer> = entry
            .overlays()
            .iter()
            .filter_map(|spec| build_layer(&resolver.resolve(&spec.text), spec, loaded.duration))
            .collect();
        tracing::debug!(
            path = %entry.path().display(),
            duration = loaded.duration,
            layers = layers.len(),
            "composing clip"
        );

        let composed = self.backend.compose(&loaded.clip, size, &layers);
        self.backend.release(loaded.clip);
        composed
    }

    fn release_all(&mut self, clips: Vec<B::Clip>) {
        for clip in clips {
            self.backend.release(clip);
        }
    }
}

/// Render `timeline` into `output_path`.
///
/// This is the boundary used by front ends: failures and panics inside the pipeline come back
/// as an unsuccessful [`RenderOutcome`] with a readable message.
#[tracing::instrument(skip_all, fields(output = %output_path.display(), item = item_identifier))]
pub fn render<B: MediaBackend>(
    backend: &mut B,
    timeline: &Timeline,
    output_path: &Path,
    item_identifier: &str,
    progress: &mut dyn FnMut(Progress),
    opts: RenderOptions<'_>,
) -> RenderOutcome {
    let run = std::panic::AssertUnwindSafe(|| {
        RenderPipeline::new(backend, opts).run(timeline, output_path, item_identifier, progress)
    });
    match std::panic::catch_unwind(run) {
        Ok(result) => RenderOutcome::from_result(result),
        Err(panic) => {
            let what = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            tracing::error!(panic = %what, "render panicked");
            RenderOutcome {
                success: false,
                message: format!("internal error during render: {what}"),
                report: None,
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Temporary sibling of the final output (`.<stem>.partial.<ext>`), removed unless committed.
struct PartialOutput(Option<PathBuf>);

impl PartialOutput {
    fn new(output_path: &Path) -> Self {
        Self(Some(partial_path(output_path)))
    }

    fn path(&self) -> &Path {
        self.0.as_deref().unwrap_or(Path::new(""))
    }

    fn commit(mut self, output_path: &Path) -> ReelResult<()> {
        let Some(tmp) = self.0.take() else {
            return Err(ReelError::media("partial output already committed"));
        };
        if let Err(e) = std::fs::rename(&tmp, output_path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(ReelError::media(format!(
                "failed to move '{}' to '{}': {e}",
                tmp.display(),
                output_path.display()
            )));
        }
        Ok(())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub(crate) fn partial_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    let name = match output_path.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    output_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_path_is_a_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("out/final.mp4")),
            PathBuf::from("out/.final.partial.mp4")
        );
        assert_eq!(
            partial_path(Path::new("final")),
            PathBuf::from(".final.partial")
        );
    }

    #[test]
    fn uncommitted_partial_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("video.mp4");
        let partial = PartialOutput::new(&out);
        std::fs::write(partial.path(), b"half").unwrap();
        let tmp = partial.path().to_path_buf();
        drop(partial);
        assert!(!tmp.exists());
        assert!(!out.exists());

        let partial = PartialOutput::new(&out);
        std::fs::write(partial.path(), b"full").unwrap();
        partial.commit(&out).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"full");
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn outcome_message_names_the_output() {
        let ok = RenderOutcome::from_result(Ok(RenderReport {
            output_path: PathBuf::from("out.mp4"),
            processed_count: 1,
            skipped: Vec::new(),
            canonical_size: FrameSize::new(2, 2).unwrap(),
        }));
        assert!(ok.success);
        assert_eq!(ok.message, "Video successfully created: out.mp4");

        let err = RenderOutcome::from_result(Err(ReelError::EmptyTimeline));
        assert!(!err.success);
        assert!(err.report.is_none());
        assert!(err.message.contains("no clips"));
    }
}
