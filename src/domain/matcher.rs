//! Locating label occurrences on a page.
//!
//! Single-word labels are matched against the page's extracted words by exact
//! case-insensitive equality. Multi-word labels go through the document's own
//! phrase search, because word boundaries and spacing in a PDF word stream are
//! not reliable enough to reassemble phrases here.

use super::geometry::{Rect, Word};
use super::terms::TermSet;

/// Margin added around a matched word so the mark covers anti-aliased glyph
/// edges.
pub const WORD_MARGIN: f32 = 0.5;

/// Characters stripped from both ends of a word before comparison.
const TRIM_CHARS: &[char] = &[',', ':', ';'];

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Word,
    Phrase,
}

/// A located label occurrence. Consumed immediately by a geometry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub rect: Rect,
    pub kind: MatchKind,
}

/// Normalizes a word the way labels are compared: punctuation-trimmed and
/// case-folded.
pub fn normalize_word(text: &str) -> String {
    text.trim_matches(TRIM_CHARS).to_lowercase()
}

/// Matches extracted words against the single-word labels.
#[derive(Debug, Clone, Copy)]
pub struct WordMatcher<'a> {
    terms: &'a TermSet,
}

impl<'a> WordMatcher<'a> {
    pub fn new(terms: &'a TermSet) -> Self {
        Self { terms }
    }

    /// Returns the match for `word`, if its normalized text is a label.
    ///
    /// Only exact equality counts: "Username" never matches the label "Name".
    pub fn match_word(&self, word: &Word) -> Option<Match> {
        let normalized = normalize_word(&word.text);
        if normalized.is_empty() || !self.terms.contains_single(&normalized) {
            return None;
        }
        Some(Match {
            rect: word.rect.expand(WORD_MARGIN),
            kind: MatchKind::Word,
        })
    }

    /// Matches every word, preserving page order.
    pub fn find_all(&self, words: &[Word]) -> Vec<Match> {
        words.iter().filter_map(|w| self.match_word(w)).collect()
    }
}

/// Matches multi-word labels through a literal, case-insensitive search.
#[derive(Debug, Clone, Copy)]
pub struct PhraseMatcher<'a> {
    terms: &'a TermSet,
}

impl<'a> PhraseMatcher<'a> {
    pub fn new(terms: &'a TermSet) -> Self {
        Self { terms }
    }

    /// Runs `search` once per phrase label and turns every hit into a match.
    ///
    /// Hits are used as returned, without margin. The first search error
    /// aborts.
    pub fn find_all<F, E>(&self, mut search: F) -> Result<Vec<Match>, E>
    where
        F: FnMut(&str) -> Result<Vec<Rect>, E>,
    {
        let mut matches = Vec::new();
        for phrase in self.terms.phrase_terms() {
            matches.extend(search(phrase)?.into_iter().map(|rect| Match {
                rect,
                kind: MatchKind::Phrase,
            }));
        }
        Ok(matches)
    }
}
