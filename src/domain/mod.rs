//! Domain models and matching logic.
//!
//! This module holds everything that decides *what* is sensitive on a page:
//! the configured labels, the page-space geometry and the two matchers. It
//! knows nothing about PDF backends.

pub mod geometry;
pub mod matcher;
pub mod terms;

pub use geometry::{Color, Rect, Word};
pub use matcher::{normalize_word, Match, MatchKind, PhraseMatcher, WordMatcher, WORD_MARGIN};
pub use terms::{TermFileError, TermList, TermSet, DEFAULT_TERMS};
