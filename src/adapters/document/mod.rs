//! Document backends
//!
//! The pipeline only talks to documents through [`MarkableDocument`]: it reads
//! page sizes and native glyphs, rasterizes pages for OCR, and commits
//! highlight or redaction marks page by page. [`DocumentLoader`] opens raw
//! bytes into such a document.
//!
//! Page indices are 0-based; every rectangle is in page units with a top-left
//! origin.
//!
//! - [`pdfium`] - PDF backend on top of PDFium
//! - [`memory`] - in-memory text layout backend

pub mod memory;
pub mod pdfium;

use crate::domain::{Glyph, MarkAction, PageSize, Rect, Result};
use image::DynamicImage;

pub use memory::{MemoryDocument, MemoryLoader};
pub use self::pdfium::{PdfiumBackend, PdfiumDocument};

/// A paginated document that can be inspected and marked
pub trait MarkableDocument {
    fn page_count(&self) -> usize;

    fn page_size(&self, page: usize) -> Result<PageSize>;

    /// Characters of the page's native text layer, in reading order
    ///
    /// Scanned pages return an empty list.
    fn page_glyphs(&self, page: usize) -> Result<Vec<Glyph>>;

    /// Render the page at `scale` pixels per page unit
    fn rasterize_page(&self, page: usize, scale: f32) -> Result<DynamicImage>;

    /// Draw an unfilled outline around each rectangle
    fn highlight(&mut self, page: usize, rects: &[Rect]) -> Result<()>;

    /// Irreversibly remove everything under each rectangle
    fn redact(&mut self, page: usize, rects: &[Rect]) -> Result<()>;

    /// Serialize the document with all committed marks
    fn save_to_bytes(&self) -> Result<Vec<u8>>;

    /// Apply `action` to the rectangles of one page
    fn mark(&mut self, page: usize, action: MarkAction, rects: &[Rect]) -> Result<()> {
        if rects.is_empty() {
            return Ok(());
        }
        match action {
            MarkAction::Highlight => self.highlight(page, rects),
            MarkAction::Redact => self.redact(page, rects),
        }
    }
}

/// Opens document bytes
pub trait DocumentLoader {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn MarkableDocument + '_>>;
}
