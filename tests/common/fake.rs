//! In-memory document backend for pipeline tests.
//!
//! Pages are described up front (words, phrase hits, injected failures) and
//! every mark, commit and save is recorded in a shared [`FakeLog`].

use anonymizer::domain::{Rect, Word};
use anonymizer::redaction::{
    CancelFlag, DocumentBackend, DocumentSurface, PageSurface, RedactionMark,
};
use anonymizer::{RedactorError, RedactorResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Which page primitive should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    Extract,
    Search,
    Commit,
}

/// Description of one page.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    words: Vec<Word>,
    phrases: Vec<(String, Rect)>,
    failure: Option<FakeFailure>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(mut self, x0: f32, y0: f32, x1: f32, y1: f32, text: &str) -> Self {
        self.words.push(Word::new(x0, y0, x1, y1, text));
        self
    }

    /// Registers a hit returned when `phrase` is searched (any case).
    pub fn phrase(mut self, phrase: &str, rect: Rect) -> Self {
        self.phrases.push((phrase.to_string(), rect));
        self
    }

    pub fn failing(mut self, failure: FakeFailure) -> Self {
        self.failure = Some(failure);
        self
    }
}

/// Everything the fake backend observed.
#[derive(Debug, Default)]
pub struct FakeLog {
    /// 1-based page numbers in load order.
    pub loaded: Vec<usize>,
    /// Phrases searched, with their page.
    pub searches: Vec<(usize, String)>,
    /// Marks committed, per page, in commit order.
    pub committed: Vec<(usize, Vec<RedactionMark>)>,
    /// Paths passed to `save`.
    pub saved: Vec<PathBuf>,
}

impl FakeLog {
    /// Marks committed on `page`, or `None` if it never committed.
    pub fn marks_on(&self, page: usize) -> Option<&[RedactionMark]> {
        self.committed
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, marks)| marks.as_slice())
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pages: Vec<FakePage>,
    log: Arc<Mutex<FakeLog>>,
    reject_open: bool,
    fail_save: bool,
    cancel_on_commit: Option<(usize, CancelFlag)>,
}

impl FakeBackend {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn rejecting_open(mut self) -> Self {
        self.reject_open = true;
        self
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Raises `flag` once `page` (1-based) has committed.
    pub fn cancel_after(mut self, page: usize, flag: CancelFlag) -> Self {
        self.cancel_on_commit = Some((page, flag));
        self
    }

    pub fn log(&self) -> MutexGuard<'_, FakeLog> {
        self.log.lock().expect("fake log poisoned")
    }
}

impl DocumentBackend for FakeBackend {
    type Document = FakeDocument;

    fn open(&self, bytes: &[u8]) -> RedactorResult<FakeDocument> {
        if self.reject_open || bytes.is_empty() {
            return Err(RedactorError::DocumentOpen {
                message: "not a document".to_string(),
                source: None,
            });
        }
        Ok(FakeDocument {
            backend: self.clone(),
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct FakeDocument {
    backend: FakeBackend,
}

impl DocumentSurface for FakeDocument {
    type Page = FakePageHandle;

    fn page_count(&self) -> RedactorResult<usize> {
        Ok(self.backend.pages.len())
    }

    fn load_page(&mut self, index: usize) -> RedactorResult<FakePageHandle> {
        let page = self
            .backend
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| RedactorError::page(index + 1, "no such page"))?;
        self.backend.log().loaded.push(index + 1);
        Ok(FakePageHandle {
            number: index + 1,
            page,
            pending: Vec::new(),
            backend: self.backend.clone(),
        })
    }

    fn save(&mut self, path: &Path) -> RedactorResult<()> {
        if self.backend.fail_save {
            return Err(RedactorError::Backend {
                backend: "fake".to_string(),
                message: "disk full".to_string(),
                source: None,
            });
        }
        let log = self.backend.log();
        let body: String = log
            .committed
            .iter()
            .map(|(page, marks)| format!("page {}: {} marks\n", page, marks.len()))
            .collect();
        drop(log);
        std::fs::write(path, body)?;
        self.backend.log().saved.push(path.to_path_buf());
        Ok(())
    }
}

pub struct FakePageHandle {
    number: usize,
    page: FakePage,
    pending: Vec<RedactionMark>,
    backend: FakeBackend,
}

impl FakePageHandle {
    fn check(&self, failure: FakeFailure) -> RedactorResult<()> {
        if self.page.failure == Some(failure) {
            return Err(RedactorError::Backend {
                backend: "fake".to_string(),
                message: format!("{:?} failed", failure),
                source: None,
            });
        }
        Ok(())
    }
}

impl PageSurface for FakePageHandle {
    fn extract_words(&self) -> RedactorResult<Vec<Word>> {
        self.check(FakeFailure::Extract)?;
        Ok(self.page.words.clone())
    }

    fn search(&self, phrase: &str) -> RedactorResult<Vec<Rect>> {
        self.backend
            .log()
            .searches
            .push((self.number, phrase.to_string()));
        self.check(FakeFailure::Search)?;
        let needle = phrase.to_lowercase();
        Ok(self
            .page
            .phrases
            .iter()
            .filter(|(p, _)| p.to_lowercase() == needle)
            .map(|(_, rect)| *rect)
            .collect())
    }

    fn mark_redaction(&mut self, mark: &RedactionMark) -> RedactorResult<()> {
        self.pending.push(mark.clone());
        Ok(())
    }

    fn commit_redactions(&mut self) -> RedactorResult<()> {
        self.check(FakeFailure::Commit)?;
        let marks = std::mem::take(&mut self.pending);
        self.backend.log().committed.push((self.number, marks));
        if let Some((page, flag)) = &self.backend.cancel_on_commit {
            if *page == self.number {
                flag.cancel();
            }
        }
        Ok(())
    }
}
