//! Stripe-wise page recognition
//!
//! A rendered page is cut into fixed-height horizontal stripes and each stripe
//! is recognized on its own. The stripe's box is the extent of its ink, mapped
//! back to page units.

use super::engine::OcrEngine;
use crate::config::OcrConfig;
use crate::domain::{ExtractedPage, OcrLine, PageSize, Rect};
use image::{DynamicImage, GrayImage};

/// Recognize a page already rendered at `config.render_zoom`
///
/// Stripes the recognizer fails on are logged and left out.
pub fn recognize_page(
    page: usize,
    image: &DynamicImage,
    size: PageSize,
    config: &OcrConfig,
    engine: &OcrEngine,
) -> ExtractedPage {
    let zoom = config.render_zoom;
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    let stripe_height = config.stripe_height_px.max(1);

    let mut lines = Vec::new();
    for (index, top) in (0..height).step_by(stripe_height as usize).enumerate() {
        let rows = stripe_height.min(height - top);
        let stripe = image.crop_imm(0, top, width, rows);

        let text = match engine.recognize(&stripe) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(page = page + 1, stripe = index, error = %e, "Stripe recognition failed");
                continue;
            }
        };
        if text.is_empty() {
            continue;
        }

        let (x0, y0, x1, y1) =
            ink_bounds(&gray, top, rows, config.ink_threshold).unwrap_or((0, top, width, top + rows));
        let rect = Rect::new(x0 as f32, y0 as f32, x1 as f32, y1 as f32)
            .scale(1.0 / zoom)
            .clamp_to(size.width, size.height);

        lines.push(OcrLine {
            text,
            rect,
            stripe_index: Some(index),
        });
    }

    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    tracing::debug!(page = page + 1, lines = lines.len(), "Page recognized");
    ExtractedPage::new(page + 1, text).with_lines(lines)
}

/// Pixel bounds `(x0, y0, x1, y1)`, end-exclusive, of the ink in rows
/// `top..top + rows`
///
/// A pixel is ink when it is darker than `255 - threshold`.
pub fn ink_bounds(
    gray: &GrayImage,
    top: u32,
    rows: u32,
    threshold: u8,
) -> Option<(u32, u32, u32, u32)> {
    let limit = 255 - threshold;
    let bottom = (top + rows).min(gray.height());
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for y in top..bottom {
        for x in 0..gray.width() {
            if gray.get_pixel(x, y).0[0] >= limit {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x + 1, y + 1),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
            });
        }
    }

    bounds
}
