//! Per-page orchestration: match, plan marks, register, commit.

use crate::domain::{PhraseMatcher, TermSet, WordMatcher};
use crate::error::{RedactorError, RedactorResult};
use tracing::debug;

use super::strategy::{GeometryPolicy, RedactionMark};
use super::surface::PageSurface;

/// What happened on one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageReport {
    pub words: usize,
    pub matches: usize,
    pub marks: usize,
}

/// Redacts single pages with a fixed term set and geometry policy.
pub struct PageRedactor<'a> {
    terms: &'a TermSet,
    policy: &'a dyn GeometryPolicy,
}

impl<'a> PageRedactor<'a> {
    pub fn new(terms: &'a TermSet, policy: &'a dyn GeometryPolicy) -> Self {
        Self { terms, policy }
    }

    /// Computes the marks for a page without touching it.
    ///
    /// Word matches come first in extraction order, then phrase matches in
    /// term order.
    pub fn plan<P>(&self, page: &P) -> RedactorResult<(PageReport, Vec<RedactionMark>)>
    where
        P: PageSurface + ?Sized,
    {
        let words = page.extract_words()?;
        let mut matches = WordMatcher::new(self.terms).find_all(&words);
        matches.extend(PhraseMatcher::new(self.terms).find_all(|phrase| page.search(phrase))?);

        let marks: Vec<RedactionMark> = matches
            .iter()
            .flat_map(|found| self.policy.marks_for(found))
            .collect();

        let report = PageReport {
            words: words.len(),
            matches: matches.len(),
            marks: marks.len(),
        };
        Ok((report, marks))
    }

    /// Redacts `page` (1-based `page_number`, used for error context).
    ///
    /// Every mark is registered before the single commit. Any failure is
    /// reported as a page processing error for `page_number`.
    pub fn redact<P>(&self, page: &mut P, page_number: usize) -> RedactorResult<PageReport>
    where
        P: PageSurface + ?Sized,
    {
        let (report, marks) = self
            .plan(page)
            .map_err(|e| attach_page(e, page_number, "matching failed"))?;

        for mark in &marks {
            page.mark_redaction(mark)
                .map_err(|e| attach_page(e, page_number, "failed to register redaction"))?;
        }

        page.commit_redactions()
            .map_err(|e| attach_page(e, page_number, "failed to apply redactions"))?;

        debug!(
            page = page_number,
            words = report.words,
            matches = report.matches,
            marks = report.marks,
            policy = self.policy.name(),
            "Page redacted"
        );
        Ok(report)
    }
}

/// Wraps `err` as a failure of `page` unless it already names one.
pub(crate) fn attach_page(err: RedactorError, page: usize, message: &str) -> RedactorError {
    match err {
        RedactorError::PageProcessing { .. } => err,
        other => RedactorError::PageProcessing {
            page,
            message: format!("{}: {}", message, other),
            source: Some(Box::new(other)),
        },
    }
}
