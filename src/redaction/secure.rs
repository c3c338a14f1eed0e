//! Secure document backend using MuPDF.
//!
//! Marks become PDF redaction annotations, and committing a page runs
//! MuPDF's redaction pass, which physically removes the covered text and
//! image content. Redacted content cannot be recovered from the output.

use super::strategy::RedactionMark;
use super::surface::{DocumentBackend, DocumentSurface, PageSurface};
use crate::domain::{Color, Rect, Word};
use crate::error::{RedactorError, RedactorResult};
use std::ffi::CString;
use std::path::Path;
use tracing::debug;

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::{Page, Quad, TextPageOptions};

/// Initial cap on search hits per phrase and page. A search that fills the
/// cap is repeated with a doubled cap, so no occurrence is dropped.
pub const DEFAULT_MAX_HITS: u32 = 1024;

const BACKEND: &str = "MuPDF";

/// Opens PDFs with MuPDF.
#[derive(Debug, Clone)]
pub struct MuPdfBackend {
    /// Initial search hit cap per phrase
    max_hits: u32,
}

impl MuPdfBackend {
    /// Creates a new backend with default settings.
    pub fn new() -> Self {
        Self {
            max_hits: DEFAULT_MAX_HITS,
        }
    }

    /// Sets the initial search hit cap per phrase and page.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits.max(1);
        self
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }
}

impl Default for MuPdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for MuPdfBackend {
    type Document = MuPdfDocument;

    fn open(&self, bytes: &[u8]) -> RedactorResult<MuPdfDocument> {
        let doc = PdfDocument::from_bytes(bytes).map_err(|e| RedactorError::DocumentOpen {
            message: format!("MuPDF could not parse the document: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(MuPdfDocument {
            doc,
            max_hits: self.max_hits,
        })
    }

    fn name(&self) -> &str {
        BACKEND
    }
}

/// A PDF opened from memory.
pub struct MuPdfDocument {
    doc: PdfDocument,
    max_hits: u32,
}

impl DocumentSurface for MuPdfDocument {
    type Page = MuPdfPage;

    fn page_count(&self) -> RedactorResult<usize> {
        let count = self.doc.page_count().map_err(|e| RedactorError::Backend {
            backend: BACKEND.to_string(),
            message: format!("Failed to get page count: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(count.max(0) as usize)
    }

    fn load_page(&mut self, index: usize) -> RedactorResult<MuPdfPage> {
        let number = index + 1;
        let page = self
            .doc
            .load_page(index as i32)
            .map_err(|e| RedactorError::PageProcessing {
                page: number,
                message: "Failed to load page".to_string(),
                source: Some(Box::new(e)),
            })?;
        let pdf_page =
            PdfPage::try_from(page.clone()).map_err(|e| RedactorError::PageProcessing {
                page: number,
                message: "Page does not support annotations".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(MuPdfPage {
            page,
            pdf_page,
            number,
            max_hits: self.max_hits,
            pending: 0,
            labels: Vec::new(),
        })
    }

    fn save(&mut self, path: &Path) -> RedactorResult<()> {
        let path_str = path.to_str().ok_or_else(|| RedactorError::InvalidInput {
            parameter: "output".to_string(),
            reason: "Path contains invalid UTF-8".to_string(),
        })?;
        self.doc.save(path_str).map_err(|e| RedactorError::Backend {
            backend: BACKEND.to_string(),
            message: format!("Failed to save redacted PDF: {}", e),
            source: Some(Box::new(e)),
        })
    }
}

/// Colour of the label text drawn over labelled marks.
const LABEL_COLOR: Color = Color::WHITE;
/// Largest font size used for a label.
const LABEL_MAX_FONT_SIZE: f32 = 12.0;
/// Smallest font size used for a label, even if it overflows its mark.
const LABEL_MIN_FONT_SIZE: f32 = 4.0;
/// Approximate Helvetica advance of an upper-case glyph, in em.
const LABEL_GLYPH_EM: f32 = 0.62;

/// A loaded page with its pending redaction annotations.
pub struct MuPdfPage {
    page: Page,
    pdf_page: PdfPage,
    number: usize,
    max_hits: u32,
    pending: usize,
    /// Labels to draw once the redaction pass has removed the content.
    labels: Vec<(Rect, CString)>,
}

impl MuPdfPage {
    fn error(&self, message: String, source: mupdf::Error) -> RedactorError {
        RedactorError::PageProcessing {
            page: self.number,
            message,
            source: Some(Box::new(source)),
        }
    }
}

impl PageSurface for MuPdfPage {
    fn extract_words(&self) -> RedactorResult<Vec<Word>> {
        let text_page = self
            .page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| self.error("Failed to extract text".to_string(), e))?;

        let mut assembler = WordAssembler::default();
        for block in text_page.blocks() {
            for line in block.lines() {
                for ch in line.chars() {
                    match ch.char() {
                        Some(c) => assembler.push(c, quad_bounds(&ch.quad())),
                        None => assembler.break_word(),
                    }
                }
                assembler.break_word();
            }
        }
        Ok(assembler.finish())
    }

    fn search(&self, phrase: &str) -> RedactorResult<Vec<Rect>> {
        // A full result may be truncated, so search again with a larger cap
        // until MuPDF reports fewer hits than allowed.
        let mut limit = self.max_hits;
        loop {
            let hits = self
                .page
                .search(phrase, limit)
                .map_err(|e| self.error("Phrase search failed".to_string(), e))?;
            if hits.len() < limit as usize {
                return Ok(hits.into_iter().map(|quad| quad_bounds(&quad)).collect());
            }
            if limit == u32::MAX {
                return Err(RedactorError::page(
                    self.number,
                    "Phrase search returned more hits than can be counted",
                ));
            }
            limit = limit.saturating_mul(2);
            debug!(page = self.number, limit, "Phrase search hit limit reached, searching again");
        }
    }

    fn mark_redaction(&mut self, mark: &RedactionMark) -> RedactorResult<()> {
        let label = match &mark.label {
            Some(label) => Some(CString::new(label.as_str()).map_err(|_| {
                RedactorError::page(self.number, "Redaction label contains a NUL byte")
            })?),
            None => None,
        };

        let annot = self
            .pdf_page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| self.error("Failed to create redaction annotation".to_string(), e))?;

        unsafe {
            ffi::set_annotation_rect(&annot, to_mupdf_rect(&mark.rect));
            ffi::set_interior_color(&annot, mark.fill.components());
        }

        if let Some(label) = label {
            self.labels.push((mark.rect, label));
        }
        self.pending += 1;
        Ok(())
    }

    fn commit_redactions(&mut self) -> RedactorResult<()> {
        if self.pending == 0 {
            return Ok(());
        }
        let number = self.number;
        self.pdf_page
            .redact()
            .map_err(|e| self.error(format!("Failed to apply redactions on page {}", number), e))?;
        self.pending = 0;

        // The redaction pass only paints the fill, so labels are drawn on
        // top of it afterwards as free-text annotations.
        for (rect, label) in std::mem::take(&mut self.labels) {
            let annot = self
                .pdf_page
                .create_annotation(PdfAnnotationType::FreeText)
                .map_err(|e| self.error("Failed to create redaction label".to_string(), e))?;
            let font_size = label_font_size(&rect, label.as_bytes().len());
            unsafe {
                ffi::set_annotation_rect(&annot, to_mupdf_rect(&rect));
                ffi::set_free_text(&annot, &label, font_size, LABEL_COLOR.components());
            }
        }
        Ok(())
    }
}

/// Font size that fits `chars` label glyphs into `rect`, within bounds.
fn label_font_size(rect: &Rect, chars: usize) -> f32 {
    let by_height = rect.height() * 0.8;
    let by_width = rect.width() / (chars.max(1) as f32 * LABEL_GLYPH_EM);
    by_height
        .min(by_width)
        .clamp(LABEL_MIN_FONT_SIZE, LABEL_MAX_FONT_SIZE)
}

fn quad_bounds(quad: &Quad) -> Rect {
    Rect {
        x0: quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
        y0: quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
        x1: quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
        y1: quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
    }
}

fn to_mupdf_rect(rect: &Rect) -> mupdf::Rect {
    mupdf::Rect {
        x0: rect.x0,
        y0: rect.y0,
        x1: rect.x1,
        y1: rect.y1,
    }
}

/// Groups per-character boxes into whitespace-separated words.
#[derive(Debug, Default)]
struct WordAssembler {
    words: Vec<Word>,
    text: String,
    bounds: Option<Rect>,
}

impl WordAssembler {
    fn push(&mut self, c: char, rect: Rect) {
        if c.is_whitespace() {
            self.break_word();
            return;
        }
        self.text.push(c);
        self.bounds = Some(match self.bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
    }

    fn break_word(&mut self) {
        if let Some(rect) = self.bounds.take() {
            self.words.push(Word {
                rect,
                text: std::mem::take(&mut self.text),
            });
        }
        self.text.clear();
    }

    fn finish(mut self) -> Vec<Word> {
        self.break_word();
        self.words
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;
    use std::ffi::CStr;

    #[repr(C)]
    struct PdfAnnotRaw {
        inner: *mut mupdf_sys::pdf_annot,
    }

    fn raw(annot: &PdfAnnotation) -> *mut mupdf_sys::pdf_annot {
        // SAFETY: `PdfAnnotation` is a single-pointer wrapper around `pdf_annot`.
        unsafe { std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot).inner }
    }

    /// Runs `f` with a fresh base context.
    ///
    /// # Safety
    /// `f` must only use the context for the duration of the call.
    unsafe fn with_context(f: impl FnOnce(*mut mupdf_sys::fz_context)) {
        let ctx = mupdf_sys::mupdf_new_base_context();
        if !ctx.is_null() {
            f(ctx);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// The annotation must be valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        let inner = raw(annot);
        with_context(|ctx| {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };
            mupdf_sys::pdf_set_annot_rect(ctx, inner, fz_rect);
        });
    }

    /// Sets the fill (`IC`) colour of a redaction annotation.
    ///
    /// # Safety
    /// The annotation must be valid.
    pub unsafe fn set_interior_color(annot: &PdfAnnotation, rgb: [f32; 3]) {
        let inner = raw(annot);
        with_context(|ctx| {
            mupdf_sys::pdf_set_annot_interior_color(ctx, inner, 3, rgb.as_ptr());
        });
    }

    /// Turns a free-text annotation into a borderless label and renders its
    /// appearance stream.
    ///
    /// # Safety
    /// The annotation must be valid and of type `FreeText`.
    pub unsafe fn set_free_text(annot: &PdfAnnotation, text: &CStr, size: f32, rgb: [f32; 3]) {
        const FONT: &[u8] = b"Helv\0";
        let inner = raw(annot);
        with_context(|ctx| {
            mupdf_sys::pdf_set_annot_contents(ctx, inner, text.as_ptr());
            mupdf_sys::pdf_set_annot_border_width(ctx, inner, 0.0);
            mupdf_sys::pdf_set_annot_default_appearance(
                ctx,
                inner,
                FONT.as_ptr().cast(),
                size,
                3,
                rgb.as_ptr(),
            );
            mupdf_sys::pdf_update_annot(ctx, inner);
        });
    }
}
