//! Background render execution.
//!
//! The owning (interactive) thread starts a render and then polls events; progress and the
//! final outcome arrive over a channel so nothing touches the owner's state from the worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use crate::config::EncodeSettings;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::backend::MediaBackend;
use crate::model::timeline::Timeline;
use crate::placeholder::source::ItemDataSource;
use crate::render::pipeline::{CancelToken, RenderOptions, RenderOutcome, render};
use crate::render::progress::Progress;

#[derive(Clone, Debug, PartialEq)]
pub enum RenderEvent {
    Progress(Progress),
    Finished(RenderOutcome),
}

/// Everything one background render needs; the timeline is a snapshot.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub timeline: Timeline,
    pub output_path: PathBuf,
    pub item_identifier: String,
    pub settings: EncodeSettings,
}

/// Runs at most one render at a time on a background thread.
#[derive(Default)]
pub struct RenderWorker {
    busy: Arc<AtomicBool>,
    cancel: CancelToken,
    events: Option<Receiver<RenderEvent>>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start `job` on a new thread. Fails with [`ReelError::RenderBusy`] while a render runs.
    pub fn start<B>(
        &mut self,
        mut backend: B,
        source: Arc<dyn ItemDataSource + Send + Sync>,
        job: RenderJob,
    ) -> ReelResult<()>
    where
        B: MediaBackend + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ReelError::RenderBusy);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let busy = Arc::clone(&self.busy);
        let worker_cancel = cancel.clone();

        let spawned = std::thread::Builder::new()
            .name("reelmerge-render".to_owned())
            .spawn(move || {
                let progress_tx = tx.clone();
                let mut on_progress = move |p: Progress| {
                    let _ = progress_tx.send(RenderEvent::Progress(p));
                };
                let opts = RenderOptions {
                    settings: job.settings,
                    source: source.as_ref(),
                    cancel: worker_cancel,
                };
                let outcome = render(
                    &mut backend,
                    &job.timeline,
                    &job.output_path,
                    &job.item_identifier,
                    &mut on_progress,
                    opts,
                );
                drop(backend);
                busy.store(false, Ordering::SeqCst);
                let _ = tx.send(RenderEvent::Finished(outcome));
            });

        match spawned {
            Ok(handle) => {
                self.cancel = cancel;
                self.events = Some(rx);
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.busy.store(false, Ordering::SeqCst);
                Err(ReelError::media(format!("failed to spawn render thread: {e}")))
            }
        }
    }

    /// Ask the running render to stop before its next clip.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next pending event, if any. Never blocks.
    pub fn try_next_event(&self) -> Option<RenderEvent> {
        let rx = self.events.as_ref()?;
        match rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the current render finishes, passing progress to `on_progress`.
    ///
    /// Returns `None` when no render was started or its outcome was already taken.
    pub fn wait(&mut self, mut on_progress: impl FnMut(&Progress)) -> Option<RenderOutcome> {
        let rx = self.events.take()?;
        let mut outcome = None;
        for ev in rx.iter() {
            match ev {
                RenderEvent::Progress(p) => on_progress(&p),
                RenderEvent::Finished(o) => {
                    outcome = Some(o);
                    break;
                }
            }
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        outcome
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
