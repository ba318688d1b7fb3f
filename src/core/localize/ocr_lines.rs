//! Approximate localization inside OCR line boxes
//!
//! OCR only yields one box per line, so the sub-span of a match is estimated
//! from its character position within the line text.

use super::similarity::partial_ratio_chars;
use crate::domain::{OcrLine, Rect};
use std::ops::Range;

/// Locate `needle` in the first OCR line that contains it
///
/// Each line is tried verbatim (case-insensitive), then with only
/// alphanumerics compared, then by partial similarity against the whole line.
pub fn locate_in_lines(needle: &str, lines: &[OcrLine], min_score: f64) -> Option<Rect> {
    let needle: Vec<char> = needle.chars().map(fold_char).collect();
    if needle.iter().all(|c| c.is_whitespace()) {
        return None;
    }

    lines.iter().find_map(|line| {
        let text: Vec<char> = line.text.chars().map(fold_char).collect();
        let span = find_verbatim(&needle, &text)
            .or_else(|| find_alphanumeric(&needle, &text))
            .or_else(|| find_partial(&needle, &text, min_score))?;
        Some(sub_rect(&line.rect, span, text.len()))
    })
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find_verbatim(needle: &[char], text: &[char]) -> Option<Range<usize>> {
    if needle.len() > text.len() {
        return None;
    }
    (0..=text.len() - needle.len())
        .find(|&start| text[start..start + needle.len()] == *needle)
        .map(|start| start..start + needle.len())
}

/// Compare alphanumerics only and map the hit back to line positions
fn find_alphanumeric(needle: &[char], text: &[char]) -> Option<Range<usize>> {
    let needle: Vec<char> = needle
        .iter()
        .copied()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if needle.is_empty() {
        return None;
    }

    let (filtered, positions): (Vec<char>, Vec<usize>) = text
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| (*c, i))
        .unzip();

    let hit = find_verbatim(&needle, &filtered)?;
    Some(positions[hit.start]..positions[hit.end - 1] + 1)
}

fn find_partial(needle: &[char], text: &[char], min_score: f64) -> Option<Range<usize>> {
    if text.is_empty() {
        return None;
    }
    let (score, range) = partial_ratio_chars(needle, text);
    if score < min_score {
        return None;
    }
    // When the needle is the longer string the whole line matched
    if needle.len() > text.len() {
        Some(0..text.len())
    } else {
        Some(range)
    }
}

/// Scale the line box horizontally to the span's share of the line text
fn sub_rect(line: &Rect, span: Range<usize>, len: usize) -> Rect {
    if len == 0 {
        return *line;
    }
    let width = line.width();
    let start = span.start as f32 / len as f32;
    let end = span.end as f32 / len as f32;
    Rect::new(
        line.x0 + width * start,
        line.y0,
        line.x0 + width * end,
        line.y1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            rect: Rect::new(0.0, 100.0, 200.0, 120.0),
            stripe_index: Some(0),
        }
    }

    #[test]
    fn test_verbatim_containment() {
        let rect = locate_in_lines("DNI", &[line("Su dni es valido.   ")], 80.0).unwrap();
        assert_eq!(rect, Rect::new(30.0, 100.0, 60.0, 120.0));
    }

    #[test]
    fn test_alphanumeric_mapping() {
        // "12-345" in the line, "12345" in the match
        let rect = locate_in_lines("12345", &[line("ab 12-345 cd")], 80.0).unwrap();
        let (x0, x1) = (rect.x0, rect.x1);
        assert!((x0 - 200.0 * 3.0 / 12.0).abs() < 1e-3);
        assert!((x1 - 200.0 * 9.0 / 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_partial_similarity() {
        let rect = locate_in_lines("ana@example.com", &[line("mail ana@exarnple.com")], 80.0);
        assert!(rect.is_some());
        assert_eq!(rect.unwrap().y0, 100.0);
    }

    #[test]
    fn test_no_match() {
        assert!(locate_in_lines("zzzz", &[line("nada que ver")], 80.0).is_none());
        assert!(locate_in_lines("   ", &[line("algo")], 80.0).is_none());
    }

    #[test]
    fn test_second_line_used() {
        let lines = vec![line("primera linea"), line("IBAN ES91")];
        assert!(locate_in_lines("es91", &lines, 80.0).is_some());
    }
}
