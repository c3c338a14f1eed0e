//! Label-driven PDF anonymization with secure redaction.
//!
//! The library finds configured sensitive-information labels ("Name",
//! "Date of Birth", "MRN", ...) in the text of each page and physically
//! removes the regions that contain them, producing a sanitized copy that
//! can be shared with third parties.
//!
//! # Features
//!
//! - **Exact label matching**: single-word labels match whole words only,
//!   ignoring case and surrounding `,:;`
//! - **Phrase labels**: multi-word labels use the document's literal,
//!   case-insensitive phrase search
//! - **Aggressive mode**: also blanks the area right of and below each label,
//!   where its value usually sits
//! - **Secure Redaction**: content is removed with MuPDF, not just covered
//! - **Progress events**: runs report status and progress over a channel
//!
//! # Architecture
//!
//! - [`domain`]: labels, geometry and matchers
//! - [`redaction`]: geometry policies, page orchestration, the pipeline and
//!   the MuPDF backend
//! - [`config`]: run configuration and persisted settings
//! - [`error`]: error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use anonymizer::{RedactionJob, RedactionMode, RedactionPipeline, RunConfig, TermList};
//! use anonymizer::redaction::ProgressReporter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let job = RedactionJob::new(
//!     RunConfig::new("report.pdf", "out", "anonymized_document.pdf", RedactionMode::Aggressive),
//!     TermList::defaults().snapshot(),
//! );
//!
//! let pipeline = RedactionPipeline::with_secure_backend();
//! let summary = pipeline.run(&job, &mut ProgressReporter::detached())?;
//! println!("{} marks on {} pages", summary.marks_applied, summary.pages_modified);
//! # Ok(())
//! # }
//! ```
//!
//! # Matching
//!
//! ```
//! use anonymizer::domain::{TermSet, Word, WordMatcher};
//!
//! let terms = TermSet::new(["Name", "Date of Birth"]);
//! let matcher = WordMatcher::new(&terms);
//!
//! assert!(matcher.match_word(&Word::new(0.0, 0.0, 30.0, 10.0, "NAME:")).is_some());
//! assert!(matcher.match_word(&Word::new(0.0, 0.0, 30.0, 10.0, "Username")).is_none());
//! assert_eq!(terms.phrase_terms(), &["Date of Birth"]);
//! ```

// Public API
pub mod config;
pub mod domain;
pub mod error;
pub mod redaction;

// Re-exports for convenient access
pub use config::{RunConfig, Settings, SettingsError};
pub use domain::{TermList, TermSet};
pub use error::{ErrorKind, RedactorError, RedactorResult};
pub use redaction::{
    MuPdfBackend, RedactionJob, RedactionMode, RedactionPipeline, RedactionSummary, RunEvent,
};
