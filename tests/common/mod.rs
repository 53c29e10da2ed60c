pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document as LopdfDocument;
use std::path::Path;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around an assembled PDF with helper methods
pub struct GeneratedPdf {
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    /// Load an assembled PDF from disk
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Get the number of pages in the PDF
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page sizes (width, height) in page order
    pub fn page_sizes(&self) -> Vec<(f32, f32)> {
        pdf_assertions::page_sizes(&self.doc)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
