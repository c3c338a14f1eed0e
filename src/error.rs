//! Error types for the anonymizer library.
//!
//! Every failure of a redaction run is funnelled into [`RedactorError`]. The
//! variants keep processing failures (the document could not be redacted)
//! apart from persistence failures (redaction worked but the result could not
//! be written), because the user reacts to them differently.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all redaction operations.
#[derive(Debug)]
pub enum RedactorError {
    /// The source document is missing or unreadable. Raised before any
    /// processing starts.
    InputNotFound { path: PathBuf, source: io::Error },

    /// The source bytes could not be parsed as a document.
    DocumentOpen {
        message: String,
        source: Option<BoxedSource>,
    },

    /// Word extraction, phrase search, marking or commit failed on a page.
    /// `page` is 1-based.
    PageProcessing {
        page: usize,
        message: String,
        source: Option<BoxedSource>,
    },

    /// Redaction succeeded but the sanitized document could not be saved.
    OutputWrite { path: PathBuf, source: BoxedSource },

    /// Invalid configuration or parameters
    InvalidInput { parameter: String, reason: String },

    /// The output file already existed and the user refused to replace it.
    OverwriteDeclined { path: PathBuf },

    /// The run was cancelled at the boundary before `page` (1-based).
    Cancelled { page: usize },

    /// Backend-specific error outside of a page context (MuPDF, ...)
    Backend {
        backend: String,
        message: String,
        source: Option<BoxedSource>,
    },
}

/// Stable, machine-friendly classification of a [`RedactorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputNotFound,
    DocumentOpen,
    PageProcessing,
    OutputWrite,
    InvalidInput,
    OverwriteDeclined,
    Cancelled,
    Backend,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputNotFound => "input_not_found",
            Self::DocumentOpen => "document_open",
            Self::PageProcessing => "page_processing",
            Self::OutputWrite => "output_write",
            Self::InvalidInput => "invalid_input",
            Self::OverwriteDeclined => "overwrite_declined",
            Self::Cancelled => "cancelled",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RedactorError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputNotFound { .. } => ErrorKind::InputNotFound,
            Self::DocumentOpen { .. } => ErrorKind::DocumentOpen,
            Self::PageProcessing { .. } => ErrorKind::PageProcessing,
            Self::OutputWrite { .. } => ErrorKind::OutputWrite,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::OverwriteDeclined { .. } => ErrorKind::OverwriteDeclined,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Backend { .. } => ErrorKind::Backend,
        }
    }

    /// Builds a page failure from a message alone.
    pub fn page(page: usize, message: impl Into<String>) -> Self {
        Self::PageProcessing {
            page,
            message: message.into(),
            source: None,
        }
    }

    /// Returns the 1-based page this error is attached to, if any.
    pub fn page_number(&self) -> Option<usize> {
        match self {
            Self::PageProcessing { page, .. } | Self::Cancelled { page } => Some(*page),
            _ => None,
        }
    }
}

impl fmt::Display for RedactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputNotFound { path, source } => {
                write!(
                    f,
                    "Input document not found or unreadable '{}': {}",
                    path.display(),
                    source
                )
            }
            Self::DocumentOpen { message, .. } => {
                write!(f, "Failed to open document: {}", message)
            }
            Self::PageProcessing { page, message, .. } => {
                write!(f, "Processing failed on page {}: {}", page, message)
            }
            Self::OutputWrite { path, source } => {
                write!(
                    f,
                    "Redaction succeeded but writing '{}' failed: {}",
                    path.display(),
                    source
                )
            }
            Self::InvalidInput { parameter, reason } => {
                write!(f, "Invalid input for '{}': {}", parameter, reason)
            }
            Self::OverwriteDeclined { path } => {
                write!(f, "Refused to overwrite existing file '{}'", path.display())
            }
            Self::Cancelled { page } => {
                write!(f, "Run cancelled before page {}", page)
            }
            Self::Backend {
                backend, message, ..
            } => {
                write!(f, "{} backend error: {}", backend, message)
            }
        }
    }
}

impl std::error::Error for RedactorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InputNotFound { source, .. } => Some(source),
            Self::OutputWrite { source, .. } => Some(source.as_ref()),
            Self::DocumentOpen { source, .. }
            | Self::PageProcessing { source, .. }
            | Self::Backend { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<io::Error> for RedactorError {
    fn from(err: io::Error) -> Self {
        Self::Backend {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
