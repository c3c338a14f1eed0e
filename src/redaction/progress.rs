//! Progress reporting between the redaction worker and its observer.
//!
//! The worker pushes [`RunEvent`]s into an unbounded channel and never waits
//! on the observer, except for an explicit [`RunEvent::Confirm`] request,
//! which is a single-shot question the worker blocks on until answered.

use crate::error::{ErrorKind, RedactorError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// An event emitted during a run.
#[derive(Debug)]
pub enum RunEvent {
    Status(String),
    /// Percentage in `0.0..=100.0`, never lower than the previous one.
    Progress(f32),
    /// A yes/no question. The worker is blocked until it is answered.
    Confirm(ConfirmRequest),
    /// Terminal: the sanitized document was written here.
    Completed(PathBuf),
    /// Terminal: the run failed and nothing was written.
    Failed { kind: ErrorKind, message: String },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed { .. })
    }
}

/// A pending yes/no question from the worker.
#[derive(Debug)]
pub struct ConfirmRequest {
    pub prompt: String,
    reply: oneshot::Sender<bool>,
}

impl ConfirmRequest {
    /// Answers the question and releases the worker.
    pub fn respond(self, answer: bool) {
        // The worker may already be gone; nothing to do then.
        let _ = self.reply.send(answer);
    }
}

/// Cooperative cancellation, checked by the pipeline between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
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

/// Sending half of the event channel, owned by the worker.
///
/// Keeps progress monotonic and lets exactly one terminal event through.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<RunEvent>,
    last: f32,
    finished: bool,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self {
            tx,
            last: 0.0,
            finished: false,
        }
    }

    /// Creates a reporter and the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// A reporter nobody listens to. Confirmations are answered "no".
    pub fn detached() -> Self {
        Self::channel().0
    }

    pub fn status(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(status = %text);
        self.send(RunEvent::Status(text));
    }

    /// Reports `percent`, clamped to `0..=100`. Values below the last
    /// reported one are raised to it.
    pub fn progress(&mut self, percent: f32) {
        let percent = if percent.is_nan() { self.last } else { percent.clamp(0.0, 100.0) };
        self.last = self.last.max(percent);
        self.send(RunEvent::Progress(self.last));
    }

    pub fn last_progress(&self) -> f32 {
        self.last
    }

    /// Asks the observer a yes/no question and blocks until it answers.
    ///
    /// Returns `false` when nobody is listening or the request is dropped
    /// unanswered. Must not be called from an async context.
    pub fn confirm(&mut self, prompt: impl Into<String>) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = ConfirmRequest {
            prompt: prompt.into(),
            reply,
        };
        if self.tx.send(RunEvent::Confirm(request)).is_err() {
            return false;
        }
        answer.blocking_recv().unwrap_or(false)
    }

    /// Emits the success events. Ignored after a terminal event.
    pub fn complete(&mut self, output: &Path) {
        if self.finished {
            return;
        }
        self.progress(100.0);
        self.status("Document anonymization completed successfully.");
        info!(output = %output.display(), "Anonymization completed");
        self.send(RunEvent::Completed(output.to_path_buf()));
        self.finished = true;
    }

    /// Emits the failure events. Ignored after a terminal event.
    pub fn fail(&mut self, err: &RedactorError) {
        if self.finished {
            return;
        }
        debug!(kind = %err.kind(), error = %err, "Anonymization failed");
        self.status(format!("Processing error: {}", err));
        self.send(RunEvent::Failed {
            kind: err.kind(),
            message: err.to_string(),
        });
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn send(&self, event: RunEvent) {
        // A closed receiver only means nobody is watching.
        let _ = self.tx.send(event);
    }
}
