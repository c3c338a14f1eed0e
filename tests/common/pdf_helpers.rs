//! PDF inspection helpers.

use anonymizer::redaction::ProgressReporter;
use anonymizer::{MuPdfBackend, RedactionJob, RedactionPipeline, RedactionSummary, RedactorResult, RunEvent};
use anyhow::Result;
use std::path::Path;
use std::sync::Mutex;

use super::fake::FakeBackend;

// MuPDF has thread-safety issues with font loading, so only one test may
// use it at a time.
pub static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// Runs `body` while holding the MuPDF lock.
pub fn with_mupdf_lock<T>(body: impl FnOnce() -> T) -> T {
    let _guard = MUPDF_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    body()
}

/// All words MuPDF extracts from a PDF, in page order.
pub fn extract_words(pdf_path: &Path) -> Result<Vec<String>> {
    let pages = RedactionPipeline::new(MuPdfBackend::new())
        .extract_words(pdf_path, None)
        .map_err(|e| anyhow::anyhow!("Failed to extract words: {}", e))?;
    Ok(pages
        .into_iter()
        .flat_map(|(_, words)| words.into_iter().map(|w| w.text))
        .collect())
}

/// Validates that a PDF is loadable and has basic structure.
pub fn is_valid_pdf(pdf_path: &Path) -> bool {
    ::lopdf::Document::load(pdf_path).is_ok()
}

/// Runs `job` on the fake backend and collects every emitted event.
pub fn run_fake(
    backend: &FakeBackend,
    job: &RedactionJob,
) -> (RedactorResult<RedactionSummary>, Vec<RunEvent>) {
    let (mut reporter, mut rx) = ProgressReporter::channel();
    let result = RedactionPipeline::new(backend.clone()).run(job, &mut reporter);
    drop(reporter);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (result, events)
}

/// Progress values in emission order.
pub fn progress_values(events: &[RunEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

/// Status texts in emission order.
pub fn statuses(events: &[RunEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Status(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

/// Terminal events only.
pub fn terminal_events(events: &[RunEvent]) -> Vec<&RunEvent> {
    events.iter().filter(|e| e.is_terminal()).collect()
}
