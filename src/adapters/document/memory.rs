//! In-memory text layout backend
//!
//! Lays plain text out on fixed-size pages with a monospace grid. Pages are
//! separated by form feeds (`\x0c`) and lines by `\n`. Marks are recorded per
//! page; redaction also deletes every glyph under a rectangle. The saved form
//! is JSON with the remaining page text and the recorded marks.

use super::{DocumentLoader, MarkableDocument};
use crate::domain::{Glyph, MarkAction, PageSize, Rect, RedlineError, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use serde::{Deserialize, Serialize};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 36.0;
pub const CHAR_WIDTH: f32 = 6.0;
pub const GLYPH_HEIGHT: f32 = 10.0;
pub const LINE_HEIGHT: f32 = 14.0;

/// A mark committed on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMark {
    pub page: usize,
    pub action: MarkAction,
    pub rects: Vec<Rect>,
}

#[derive(Debug, Clone, Default)]
struct MemoryPage {
    glyphs: Vec<Glyph>,
}

impl MemoryPage {
    fn layout(text: &str) -> Self {
        let mut glyphs = Vec::new();
        for (row, line) in text.split('\n').enumerate() {
            let y = MARGIN + row as f32 * LINE_HEIGHT;
            if row > 0 {
                glyphs.push(Glyph::new('\n', Rect::new(MARGIN, y, MARGIN, y + GLYPH_HEIGHT)));
            }
            for (col, ch) in line.chars().enumerate() {
                let x = MARGIN + col as f32 * CHAR_WIDTH;
                glyphs.push(Glyph::new(ch, Rect::new(x, y, x + CHAR_WIDTH, y + GLYPH_HEIGHT)));
            }
        }
        Self { glyphs }
    }

    fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }
}

#[derive(Debug, Serialize)]
struct SavedDocument<'a> {
    pages: Vec<String>,
    marks: &'a [PageMark],
}

/// Plain text laid out on a monospace grid
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
    marks: Vec<PageMark>,
}

impl MemoryDocument {
    /// One page per entry
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        Self {
            pages: pages.iter().map(|p| MemoryPage::layout(p.as_ref())).collect(),
            marks: Vec::new(),
        }
    }

    /// Pages separated by form feeds
    pub fn from_text(text: &str) -> Self {
        let pages: Vec<&str> = text.split('\x0c').collect();
        Self::from_pages(&pages)
    }

    /// Page without a text layer, as produced by a scanner
    pub fn push_scanned_page(&mut self) {
        self.pages.push(MemoryPage::default());
    }

    pub fn marks(&self) -> &[PageMark] {
        &self.marks
    }

    /// Current text of a page, after any redaction
    pub fn page_text(&self, page: usize) -> Option<String> {
        self.pages.get(page).map(MemoryPage::text)
    }

    fn page(&self, page: usize) -> Result<&MemoryPage> {
        self.pages
            .get(page)
            .ok_or_else(|| RedlineError::Document(format!("page index {page} out of range")))
    }

    fn record(&mut self, page: usize, action: MarkAction, rects: &[Rect]) -> Result<()> {
        self.page(page)?;
        self.marks.push(PageMark {
            page,
            action,
            rects: rects.to_vec(),
        });
        Ok(())
    }
}

impl MarkableDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Result<PageSize> {
        self.page(page)?;
        Ok(PageSize {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
        })
    }

    fn page_glyphs(&self, page: usize) -> Result<Vec<Glyph>> {
        Ok(self.page(page)?.glyphs.clone())
    }

    /// White page with a solid block per visible glyph
    fn rasterize_page(&self, page: usize, scale: f32) -> Result<DynamicImage> {
        let glyphs = &self.page(page)?.glyphs;
        let width = (PAGE_WIDTH * scale).round().max(1.0) as u32;
        let height = (PAGE_HEIGHT * scale).round().max(1.0) as u32;
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        for glyph in glyphs.iter().filter(|g| !g.ch.is_whitespace()) {
            let r = glyph.rect.scale(scale);
            let w = r.width().round().max(1.0) as u32;
            let h = r.height().round().max(1.0) as u32;
            draw_filled_rect_mut(
                &mut image,
                imageproc::rect::Rect::at(r.x0.round() as i32, r.y0.round() as i32).of_size(w, h),
                Rgba([0, 0, 0, 255]),
            );
        }

        Ok(DynamicImage::ImageRgba8(image))
    }

    fn highlight(&mut self, page: usize, rects: &[Rect]) -> Result<()> {
        self.record(page, MarkAction::Highlight, rects)
    }

    fn redact(&mut self, page: usize, rects: &[Rect]) -> Result<()> {
        self.record(page, MarkAction::Redact, rects)?;
        if let Some(target) = self.pages.get_mut(page) {
            target
                .glyphs
                .retain(|g| g.ch.is_whitespace() || !rects.iter().any(|r| r.intersects(&g.rect)));
        }
        Ok(())
    }

    fn save_to_bytes(&self) -> Result<Vec<u8>> {
        let saved = SavedDocument {
            pages: self.pages.iter().map(MemoryPage::text).collect(),
            marks: &self.marks,
        };
        serde_json::to_vec_pretty(&saved)
            .map_err(|e| RedlineError::Persistence(format!("Failed to save document: {e}")))
    }
}

/// Opens UTF-8 text as a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryLoader;

impl DocumentLoader for MemoryLoader {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn MarkableDocument + '_>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RedlineError::Input(format!("Document is not UTF-8 text: {e}")))?;
        Ok(Box::new(MemoryDocument::from_text(text)))
    }
}
