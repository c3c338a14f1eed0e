//! The document capabilities the redaction engine consumes.
//!
//! A backend opens an in-memory snapshot of a document. Pages expose word
//! extraction and literal phrase search for matching, plus the two mutating
//! primitives: queue a mark, then commit every queued mark at once.

use crate::domain::{Rect, Word};
use crate::error::RedactorResult;
use std::path::Path;

use super::strategy::RedactionMark;

/// A single page of an opened document.
pub trait PageSurface {
    /// Returns the page's words with their bounding boxes.
    fn extract_words(&self) -> RedactorResult<Vec<Word>>;

    /// Finds every occurrence of `phrase`, ignoring case.
    fn search(&self, phrase: &str) -> RedactorResult<Vec<Rect>>;

    /// Queues `mark` for destructive redaction.
    fn mark_redaction(&mut self, mark: &RedactionMark) -> RedactorResult<()>;

    /// Destructively applies every queued mark. Irreversible.
    fn commit_redactions(&mut self) -> RedactorResult<()>;
}

/// An opened, exclusively owned document.
pub trait DocumentSurface {
    type Page: PageSurface;

    fn page_count(&self) -> RedactorResult<usize>;

    /// Loads the page at 0-based `index`.
    fn load_page(&mut self, index: usize) -> RedactorResult<Self::Page>;

    /// Writes the document, including committed redactions, to `path`.
    fn save(&mut self, path: &Path) -> RedactorResult<()>;
}

/// Opens documents from raw bytes.
///
/// The source file is never handed to the backend, so it is neither held
/// open nor modified in place.
pub trait DocumentBackend: Send + Sync {
    type Document: DocumentSurface;

    fn open(&self, bytes: &[u8]) -> RedactorResult<Self::Document>;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &str;
}
