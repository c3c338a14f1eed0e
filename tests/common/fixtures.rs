//! Test fixtures and PDF builders.
//!
//! Provides builders for creating test PDFs and run jobs, following the
//! Builder pattern for clean test setup.

use anonymizer::{RedactionJob, RedactionMode, RunConfig, TermSet};
use anyhow::Result;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Builder for text PDFs with one line of text per `line` call.
///
/// # Example
///
/// ```no_run
/// # use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// TestPdfBuilder::new()
///     .line("Patient Name: Jane Doe")
///     .line("SSN: 123-45-6789")
///     .new_page()
///     .line("Discharge Date: 2024-03-01")
///     .build(Path::new("/tmp/record.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    font_size: f32,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Clinical Record".to_string(),
            pages: vec![Vec::new()],
            font_size: 12.0,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds a line of text to the current page.
    pub fn line(mut self, text: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(text.to_string());
        }
        self
    }

    /// Starts a new page.
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        for (page_index, lines) in self.pages.iter().enumerate() {
            let layer = if page_index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            for (i, text) in lines.iter().enumerate() {
                let y = 270.0 - i as f32 * 15.0;
                layer.use_text(text.as_str(), self.font_size, Mm(20.0), Mm(y), &font);
            }
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a one-page intake form with common labelled fields.
pub fn create_intake_form(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_title("Intake Form")
        .line("Patient Name: Jane Doe")
        .line("SSN: 123-45-6789")
        .line("Date of Birth: 1980-01-01")
        .line("Diagnosis: seasonal allergies")
        .build(path)
}

/// Writes a placeholder input file and returns a job reading it, with
/// output going to `<dir>/out/anonymized.pdf`.
pub fn fake_job(dir: &Path, mode: RedactionMode, terms: &[&str]) -> RedactionJob {
    let input = dir.join("input.pdf");
    fs::write(&input, b"%PDF-fake").expect("write placeholder input");
    RedactionJob::new(
        RunConfig::new(input, dir.join("out"), "anonymized.pdf", mode),
        TermSet::new(terms),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let builder = TestPdfBuilder::new()
            .line("a")
            .line("b")
            .new_page()
            .line("c");
        assert_eq!(builder.pages.len(), 2);
        assert_eq!(builder.pages[0], vec!["a", "b"]);
    }
}
