//! Searchable view over a page's native glyphs

use crate::core::detection::normalize::ligature_expansion;
use crate::domain::{Glyph, Rect};

/// A whitespace-delimited run of glyphs on one line
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub rect: Rect,
}

/// Glyphs of a page plus the derived search text and word list
///
/// The search text is the glyph stream with ligatures expanded, letters
/// lowercased and whitespace runs collapsed to one space. Every byte of the
/// search text maps back to the glyph it came from.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    glyphs: Vec<Glyph>,
    search_text: String,
    byte_to_glyph: Vec<usize>,
    words: Vec<Word>,
}

impl PageLayout {
    pub fn new(glyphs: Vec<Glyph>, line_tolerance: f32) -> Self {
        let (search_text, byte_to_glyph) = build_search_text(&glyphs);
        let words = build_words(&glyphs, line_tolerance);
        Self {
            glyphs,
            search_text,
            byte_to_glyph,
            words,
        }
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph index ranges (inclusive) of every non-overlapping occurrence of
    /// `needle`, compared case-insensitively with whitespace collapsed
    pub fn find_all(&self, needle: &str) -> Vec<(usize, usize)> {
        let needle = fold(needle);
        if needle.is_empty() {
            return Vec::new();
        }

        self.search_text
            .match_indices(&needle)
            .map(|(start, found)| {
                let end = start + found.len();
                (self.byte_to_glyph[start], self.byte_to_glyph[end - 1])
            })
            .collect()
    }
}

/// Lowercase, expand ligatures and collapse whitespace
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        push_folded(&mut out, ch);
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Case-insensitive comparison of two characters
pub fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn push_folded(out: &mut String, ch: char) {
    match ligature_expansion(ch) {
        Some(expanded) => out.push_str(expanded),
        None => out.extend(ch.to_lowercase()),
    }
}

fn build_search_text(glyphs: &[Glyph]) -> (String, Vec<usize>) {
    let mut text = String::new();
    let mut map = Vec::new();

    for (idx, glyph) in glyphs.iter().enumerate() {
        if glyph.ch.is_whitespace() {
            if text.is_empty() || text.ends_with(' ') {
                continue;
            }
            text.push(' ');
        } else {
            push_folded(&mut text, glyph.ch);
        }
        map.resize(text.len(), idx);
    }

    if text.ends_with(' ') {
        text.pop();
        map.pop();
    }

    (text, map)
}

fn build_words(glyphs: &[Glyph], line_tolerance: f32) -> Vec<Word> {
    let mut words = Vec::new();
    let mut text = String::new();
    let mut rect: Option<Rect> = None;

    let mut flush = |text: &mut String, rect: &mut Option<Rect>| {
        if let Some(r) = rect.take() {
            words.push(Word {
                text: std::mem::take(text),
                rect: r,
            });
        }
        text.clear();
    };

    for glyph in glyphs {
        if glyph.ch.is_whitespace() {
            flush(&mut text, &mut rect);
            continue;
        }

        if let Some(r) = rect {
            if (glyph.rect.center_y() - r.center_y()).abs() > line_tolerance {
                flush(&mut text, &mut rect);
            }
        }

        match ligature_expansion(glyph.ch) {
            Some(expanded) => text.push_str(expanded),
            None => text.push(glyph.ch),
        }
        rect = Some(match rect {
            Some(r) => r.union(&glyph.rect),
            None => glyph.rect,
        });
    }
    flush(&mut text, &mut rect);

    words
}

/// Group non-whitespace glyphs into lines by vertical proximity
pub fn group_lines<'a>(
    glyphs: impl IntoIterator<Item = &'a Glyph>,
    tolerance: f32,
) -> Vec<Vec<&'a Glyph>> {
    let mut lines: Vec<Vec<&Glyph>> = Vec::new();

    for glyph in glyphs {
        if glyph.ch.is_whitespace() {
            continue;
        }
        match lines.last_mut() {
            Some(line)
                if (glyph.rect.center_y() - line[0].rect.center_y()).abs() <= tolerance =>
            {
                line.push(glyph)
            }
            _ => lines.push(vec![glyph]),
        }
    }

    lines
}

/// Split one line into word groups at horizontal gaps wider than
/// `gap_factor` times the line's average glyph width
pub fn word_group_rects(line: &[&Glyph], gap_factor: f32) -> Vec<Rect> {
    if line.is_empty() {
        return Vec::new();
    }

    let avg_width = line.iter().map(|g| g.rect.width()).sum::<f32>() / line.len() as f32;
    let max_gap = gap_factor * avg_width;

    let mut rects = Vec::new();
    let mut current = line[0].rect;
    let mut prev_x1 = line[0].rect.x1;

    for glyph in &line[1..] {
        if glyph.rect.x0 - prev_x1 > max_gap {
            rects.push(current);
            current = glyph.rect;
        } else {
            current = current.union(&glyph.rect);
        }
        prev_x1 = glyph.rect.x1;
    }
    rects.push(current);

    rects
}

/// One rectangle per line covering the given glyphs
pub fn line_rects<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>, tolerance: f32) -> Vec<Rect> {
    group_lines(glyphs, tolerance)
        .iter()
        .filter_map(|line| Rect::bounding(line.iter().map(|g| g.rect)))
        .collect()
}
