//! Document redaction pipeline.
//!
//! [`RedactionPipeline`] drives a whole run: it reads the source into memory,
//! hands the bytes to a [`DocumentBackend`], redacts every page in order with
//! a [`PageRedactor`], and only then writes the sanitized copy. Any failure
//! discards the in-memory document, so a failed run never leaves output
//! behind.

pub mod page;
pub mod progress;
pub mod secure;
pub mod strategy;
pub mod surface;

pub use page::{PageRedactor, PageReport};
pub use progress::{CancelFlag, ConfirmRequest, ProgressReporter, RunEvent};
pub use secure::MuPdfBackend;
pub use strategy::{
    AggressivePolicy, GeometryPolicy, RedactionMark, RedactionMode, RedactionSummary,
    StandardPolicy, REDACTED_LABEL,
};
pub use surface::{DocumentBackend, DocumentSurface, PageSurface};

use crate::config::RunConfig;
use crate::domain::{TermSet, Word};
use crate::error::{RedactorError, RedactorResult};
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Progress after the document is opened.
const PROGRESS_OPENED: f32 = 10.0;
/// Progress span shared by the pages.
const PROGRESS_PAGES: f32 = 80.0;
/// Progress right before saving.
const PROGRESS_SAVING: f32 = 95.0;

/// Everything a run needs, captured once before it starts.
///
/// The pipeline never consults shared configuration while running, so
/// editing terms or switching modes cannot affect a run in flight.
#[derive(Debug, Clone)]
pub struct RedactionJob {
    pub config: RunConfig,
    pub terms: TermSet,
}

impl RedactionJob {
    pub fn new(config: RunConfig, terms: TermSet) -> Self {
        Self { config, terms }
    }
}

/// Redaction pipeline coordinating a backend, progress and cancellation.
pub struct RedactionPipeline<B> {
    backend: B,
    cancel: CancelFlag,
    overwrite: bool,
}

impl<B: DocumentBackend> RedactionPipeline<B> {
    /// Creates a new pipeline over the specified backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cancel: CancelFlag::new(),
            overwrite: false,
        }
    }

    /// Uses `cancel` for cooperative cancellation between pages.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces an existing output file without asking.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs `job` to completion on the calling thread.
    ///
    /// Exactly one terminal event (`Completed` or `Failed`) is sent through
    /// `reporter`. The same outcome is returned.
    pub fn run(
        &self,
        job: &RedactionJob,
        reporter: &mut ProgressReporter,
    ) -> RedactorResult<RedactionSummary> {
        match self.execute(job, reporter) {
            Ok(summary) => {
                reporter.complete(&summary.output);
                Ok(summary)
            }
            Err(err) => {
                reporter.fail(&err);
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        job: &RedactionJob,
        reporter: &mut ProgressReporter,
    ) -> RedactorResult<RedactionSummary> {
        let config = &job.config;
        reporter.progress(0.0);
        config.validate()?;

        let bytes = std::fs::read(&config.input).map_err(|source| RedactorError::InputNotFound {
            path: config.input.clone(),
            source,
        })?;

        let output = config.output_path();
        if output.exists() && !self.overwrite {
            let prompt = format!(
                "'{}' already exists. Replace it with the anonymized document?",
                output.display()
            );
            if !reporter.confirm(prompt) {
                return Err(RedactorError::OverwriteDeclined { path: output });
            }
        }

        info!(
            input = %config.input.display(),
            mode = %config.mode,
            single_terms = job.terms.single_terms().len(),
            phrase_terms = job.terms.phrase_terms().len(),
            backend = self.backend.name(),
            "Starting anonymization"
        );

        reporter.status("Opening PDF document…");
        let mut doc = self.backend.open(&bytes)?;
        drop(bytes);
        reporter.progress(PROGRESS_OPENED);

        let total = doc.page_count()?;
        let policy = config.mode.policy();
        let redactor = PageRedactor::new(&job.terms, policy.as_ref());
        let mut summary = RedactionSummary {
            pages_processed: 0,
            output: output.clone(),
            ..Default::default()
        };

        for index in 0..total {
            let number = index + 1;
            if self.cancel.is_cancelled() {
                return Err(RedactorError::Cancelled { page: number });
            }

            reporter.status(format!("Processing page {} of {}…", number, total));
            let mut page = doc
                .load_page(index)
                .map_err(|e| page::attach_page(e, number, "failed to load page"))?;
            let report = redactor.redact(&mut page, number)?;

            summary.pages_processed += 1;
            summary.matches += report.matches;
            summary.marks_applied += report.marks;
            if report.marks > 0 {
                summary.pages_modified += 1;
            }
            reporter.progress(PROGRESS_OPENED + PROGRESS_PAGES * number as f32 / total as f32);
        }
        reporter.progress(PROGRESS_OPENED + PROGRESS_PAGES);

        reporter.status("Saving anonymized document…");
        reporter.progress(PROGRESS_SAVING);
        save_atomically(&mut doc, &config.output_folder, &output)?;

        info!(
            pages = summary.pages_processed,
            modified = summary.pages_modified,
            matches = summary.matches,
            marks = summary.marks_applied,
            "Document redacted"
        );
        Ok(summary)
    }

    /// Extracts the words of every page, or of the 1-based `only_page`.
    ///
    /// Read-only; nothing is marked or saved.
    pub fn extract_words(
        &self,
        input: &Path,
        only_page: Option<usize>,
    ) -> RedactorResult<Vec<(usize, Vec<Word>)>> {
        let bytes = std::fs::read(input).map_err(|source| RedactorError::InputNotFound {
            path: input.to_path_buf(),
            source,
        })?;
        let mut doc = self.backend.open(&bytes)?;
        let total = doc.page_count()?;

        let pages: Vec<usize> = match only_page {
            Some(n) if n == 0 || n > total => {
                return Err(RedactorError::InvalidInput {
                    parameter: "page".to_string(),
                    reason: format!("page {} out of range 1..={}", n, total),
                })
            }
            Some(n) => vec![n],
            None => (1..=total).collect(),
        };

        let mut out = Vec::with_capacity(pages.len());
        for number in pages {
            let page = doc.load_page(number - 1)?;
            out.push((number, page.extract_words()?));
        }
        Ok(out)
    }
}

impl<B> RedactionPipeline<B>
where
    B: DocumentBackend + 'static,
{
    /// Runs `job` on the blocking worker pool and returns the event stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        self,
        job: RedactionJob,
    ) -> (
        JoinHandle<RedactorResult<RedactionSummary>>,
        mpsc::UnboundedReceiver<RunEvent>,
    ) {
        let (mut reporter, events) = ProgressReporter::channel();
        let handle = tokio::task::spawn_blocking(move || self.run(&job, &mut reporter));
        (handle, events)
    }
}

impl RedactionPipeline<MuPdfBackend> {
    /// Creates a pipeline with secure (physical removal) redaction.
    pub fn with_secure_backend() -> Self {
        Self::new(MuPdfBackend::default())
    }
}

/// Saves into a temporary file next to `output`, then renames it into place,
/// so a failed save leaves nothing at `output`.
fn save_atomically<D: DocumentSurface>(
    doc: &mut D,
    folder: &Path,
    output: &Path,
) -> RedactorResult<()> {
    let write_error = |source: Box<dyn std::error::Error + Send + Sync>| RedactorError::OutputWrite {
        path: output.to_path_buf(),
        source,
    };

    let folder = if folder.as_os_str().is_empty() {
        Path::new(".")
    } else {
        folder
    };
    std::fs::create_dir_all(folder).map_err(|e| write_error(Box::new(e)))?;

    let temp = tempfile::Builder::new()
        .prefix(".anonymizer-")
        .suffix(".pdf.tmp")
        .tempfile_in(folder)
        .map_err(|e| write_error(Box::new(e)))?;

    doc.save(temp.path()).map_err(|e| write_error(Box::new(e)))?;
    temp.persist(output).map_err(|e| write_error(Box::new(e.error)))?;
    Ok(())
}
