//! PDF backend on top of PDFium
//!
//! Highlights are red stroked rectangle paths with no fill. Redaction renders
//! the page, paints the rectangles opaque black on the raster and replaces
//! every page object with that raster, so the covered text and vector content
//! no longer exist in the output.

use super::{DocumentLoader, MarkableDocument};
use crate::config::RedactionConfig;
use crate::domain::{Glyph, PageSize, Rect, RedlineError, Result};
use image::{DynamicImage, Rgba};
use imageproc::drawing::draw_filled_rect_mut;
use pdfium_render::prelude::*;
use std::path::Path;

/// PDF points per inch
const POINTS_PER_INCH: f32 = 72.0;

fn document_error(context: &str, err: PdfiumError) -> RedlineError {
    RedlineError::Document(format!("{context}: {err}"))
}

/// Bind PDFium from `library_dir` when given, then from the working
/// directory, then from the system library path
pub fn bind_pdfium(library_dir: Option<&str>) -> Result<Pdfium> {
    let mut dirs: Vec<&str> = Vec::new();
    if let Some(dir) = library_dir {
        dirs.push(dir);
    }
    dirs.push("./");

    for dir in dirs {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(Path::new(dir));
        match Pdfium::bind_to_library(&lib_path) {
            Ok(bindings) => {
                tracing::info!(path = %lib_path.display(), "PDFium library loaded");
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => {
                tracing::debug!(path = %lib_path.display(), error = %e, "PDFium not found at path");
            }
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| RedlineError::Document(format!("PDFium library unavailable: {e}")))
}

/// Opens PDFs with a bound PDFium library
pub struct PdfiumBackend {
    pdfium: Pdfium,
    render_dpi: u32,
    highlight_width: f32,
}

impl PdfiumBackend {
    pub fn new(pdfium: Pdfium, config: &RedactionConfig) -> Self {
        Self {
            pdfium,
            render_dpi: config.render_dpi,
            highlight_width: config.highlight_width,
        }
    }

    /// Bind the library according to configuration
    pub fn from_config(config: &RedactionConfig) -> Result<Self> {
        let pdfium = bind_pdfium(config.pdfium_library_path.as_deref())?;
        Ok(Self::new(pdfium, config))
    }
}

impl DocumentLoader for PdfiumBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn MarkableDocument + '_>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes.to_vec(), None)
            .map_err(|e| RedlineError::Input(format!("Unreadable PDF: {e}")))?;

        tracing::debug!(pages = document.pages().len(), "PDF opened");

        Ok(Box::new(PdfiumDocument {
            document,
            render_dpi: self.render_dpi,
            highlight_width: self.highlight_width,
        }))
    }
}

/// An open PDF document
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    render_dpi: u32,
    highlight_width: f32,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, page: usize) -> Result<PdfPage<'a>> {
        let index = u16::try_from(page)
            .map_err(|_| RedlineError::Document(format!("page index {page} out of range")))?;
        self.document
            .pages()
            .get(index)
            .map_err(|e| document_error(&format!("page {page}"), e))
    }

    fn render(&self, page: &PdfPage, scale: f32) -> Result<DynamicImage> {
        let width = (page.width().value * scale).round().max(1.0) as i32;
        let height = (page.height().value * scale).round().max(1.0) as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| document_error("render failed", e))?;

        Ok(bitmap.as_image())
    }
}

/// PDF rectangle (bottom-left origin) to a top-left origin rectangle
fn to_page_rect(rect: &PdfRect, page_height: f32) -> Rect {
    Rect::new(
        rect.left().value,
        page_height - rect.top().value,
        rect.right().value,
        page_height - rect.bottom().value,
    )
}

/// Top-left origin rectangle back to PDF space
fn to_pdf_rect(rect: &Rect, page_height: f32) -> PdfRect {
    PdfRect::new_from_values(
        page_height - rect.y1,
        rect.x0,
        page_height - rect.y0,
        rect.x1,
    )
}

impl MarkableDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        usize::from(self.document.pages().len())
    }

    fn page_size(&self, page: usize) -> Result<PageSize> {
        let page = self.page(page)?;
        Ok(PageSize {
            width: page.width().value,
            height: page.height().value,
        })
    }

    fn page_glyphs(&self, page: usize) -> Result<Vec<Glyph>> {
        let page = self.page(page)?;
        let page_height = page.height().value;
        let text = page
            .text()
            .map_err(|e| document_error("text layer unavailable", e))?;

        let mut glyphs = Vec::new();
        for ch in text.chars().iter() {
            let Some(unicode) = ch.unicode_char() else {
                continue;
            };
            match ch.loose_bounds() {
                Ok(bounds) => glyphs.push(Glyph::new(unicode, to_page_rect(&bounds, page_height))),
                // Generated separators may have no box; they still delimit words
                Err(_) if unicode.is_whitespace() => {
                    glyphs.push(Glyph::new(unicode, Rect::new(0.0, 0.0, 0.0, 0.0)))
                }
                Err(_) => {}
            }
        }

        Ok(glyphs)
    }

    fn rasterize_page(&self, page: usize, scale: f32) -> Result<DynamicImage> {
        let page = self.page(page)?;
        self.render(&page, scale)
    }

    fn highlight(&mut self, page: usize, rects: &[Rect]) -> Result<()> {
        let mut pdf_page = self.page(page)?;
        let page_height = pdf_page.height().value;
        let red = PdfColor::new(255, 0, 0, 255);

        for rect in rects {
            pdf_page
                .objects_mut()
                .create_path_object_rect(
                    to_pdf_rect(rect, page_height),
                    Some(red),
                    Some(PdfPoints::new(self.highlight_width)),
                    None,
                )
                .map_err(|e| document_error("highlight failed", e))?;
        }

        Ok(())
    }

    fn redact(&mut self, page: usize, rects: &[Rect]) -> Result<()> {
        let mut pdf_page = self.page(page)?;
        let width = pdf_page.width().value;
        let height = pdf_page.height().value;
        let scale = self.render_dpi as f32 / POINTS_PER_INCH;

        let mut raster = self.render(&pdf_page, scale)?.to_rgba8();
        let (img_w, img_h) = raster.dimensions();
        let black = Rgba([0u8, 0u8, 0u8, 255u8]);

        for rect in rects {
            let px = rect.clamp_to(width, height).scale(scale);
            let x0 = px.x0.floor().max(0.0) as u32;
            let y0 = px.y0.floor().max(0.0) as u32;
            let x1 = (px.x1.ceil() as u32).min(img_w);
            let y1 = (px.y1.ceil() as u32).min(img_h);
            if x1 > x0 && y1 > y0 {
                draw_filled_rect_mut(
                    &mut raster,
                    imageproc::rect::Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0),
                    black,
                );
            }
        }

        let objects = pdf_page.objects_mut();
        while !objects.is_empty() {
            objects
                .remove_object_at_index(0)
                .map_err(|e| document_error("removing page content failed", e))?;
        }

        let mut image_object =
            PdfPageImageObject::new(&self.document, &DynamicImage::ImageRgba8(raster))
                .map_err(|e| document_error("creating page raster failed", e))?;
        image_object
            .scale(width, height)
            .map_err(|e| document_error("scaling page raster failed", e))?;

        pdf_page
            .objects_mut()
            .add_image_object(image_object)
            .map_err(|e| document_error("adding page raster failed", e))?;

        tracing::debug!(page, rects = rects.len(), "Page flattened for redaction");
        Ok(())
    }

    fn save_to_bytes(&self) -> Result<Vec<u8>> {
        self.document
            .save_to_bytes()
            .map_err(|e| RedlineError::Persistence(format!("Failed to save PDF: {e}")))
    }
}
