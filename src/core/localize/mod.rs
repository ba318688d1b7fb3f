//! Coordinate localization
//!
//! Maps a detected text span back onto page geometry. Strategies are tried in
//! a fixed order and the first one that yields at least one rectangle wins:
//!
//! 1. exact search of the raw matched text
//! 2. exact search of the validation-normalized value
//! 3. character-level alignment against the glyph stream
//! 4. word-sequence search
//! 5. fuzzy word search
//! 6. OCR line fallback (only when the page has OCR line geometry)
//!
//! Rectangles are returned exactly as computed; no padding is added.

pub mod layout;
pub mod ocr_lines;
pub mod similarity;

use crate::config::LocalizationConfig;
use crate::core::detection::normalize::{ligature_expansion, normalize_for_search};
use crate::domain::{Glyph, Match, OcrLine, Rect};
use layout::{chars_match, fold, group_lines, line_rects, word_group_rects};
use std::fmt;

pub use layout::{PageLayout, Word};

/// Extra words a fuzzy window may skip over
const FUZZY_SLACK: usize = 5;

/// Strategy that located a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExactRaw,
    ExactNormalized,
    CharAlignment,
    WordSequence,
    Fuzzy,
    OcrLine,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::ExactRaw => "exact-raw",
            Strategy::ExactNormalized => "exact-normalized",
            Strategy::CharAlignment => "char-alignment",
            Strategy::WordSequence => "word-sequence",
            Strategy::Fuzzy => "fuzzy",
            Strategy::OcrLine => "ocr-line",
        };
        f.write_str(name)
    }
}

/// Rectangles covering one match
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedRegion {
    pub rects: Vec<Rect>,
    pub strategy: Strategy,
}

type StrategyFn = fn(&Localizer, &PageLayout, &[OcrLine], &Match) -> Option<Vec<Rect>>;

const CASCADE: [(Strategy, StrategyFn); 6] = [
    (Strategy::ExactRaw, Localizer::exact_raw),
    (Strategy::ExactNormalized, Localizer::exact_normalized),
    (Strategy::CharAlignment, Localizer::char_alignment),
    (Strategy::WordSequence, Localizer::word_sequence),
    (Strategy::Fuzzy, Localizer::fuzzy_words),
    (Strategy::OcrLine, Localizer::ocr_line),
];

/// Localization cascade with its tuning parameters
#[derive(Debug, Clone)]
pub struct Localizer {
    line_tolerance: f32,
    word_gap_factor: f32,
    min_fuzzy_score: f64,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new(&LocalizationConfig::default())
    }
}

impl Localizer {
    pub fn new(config: &LocalizationConfig) -> Self {
        Self {
            line_tolerance: config.line_tolerance,
            word_gap_factor: config.word_gap_factor,
            min_fuzzy_score: f64::from(config.min_fuzzy_score),
        }
    }

    pub fn line_tolerance(&self) -> f32 {
        self.line_tolerance
    }

    /// Build the searchable layout for a page's glyphs
    pub fn layout(&self, glyphs: Vec<Glyph>) -> PageLayout {
        PageLayout::new(glyphs, self.line_tolerance)
    }

    /// Run the cascade for one match
    pub fn locate(
        &self,
        layout: &PageLayout,
        ocr_lines: &[OcrLine],
        m: &Match,
    ) -> Option<LocatedRegion> {
        CASCADE.iter().find_map(|(strategy, run)| {
            run(self, layout, ocr_lines, m)
                .filter(|rects| !rects.is_empty())
                .map(|rects| LocatedRegion {
                    rects,
                    strategy: *strategy,
                })
        })
    }

    fn exact(&self, layout: &PageLayout, needle: &str) -> Option<Vec<Rect>> {
        let rects: Vec<Rect> = layout
            .find_all(needle)
            .into_iter()
            .flat_map(|(first, last)| {
                line_rects(&layout.glyphs()[first..=last], self.line_tolerance)
            })
            .collect();
        (!rects.is_empty()).then_some(rects)
    }

    fn exact_raw(&self, layout: &PageLayout, _: &[OcrLine], m: &Match) -> Option<Vec<Rect>> {
        self.exact(layout, &m.raw)
    }

    fn exact_normalized(
        &self,
        layout: &PageLayout,
        _: &[OcrLine],
        m: &Match,
    ) -> Option<Vec<Rect>> {
        if fold(&m.normalized) == fold(&m.raw) {
            return None;
        }
        self.exact(layout, &m.normalized)
    }

    /// Align the search string against consecutive glyphs, tolerating
    /// whitespace that only one side has and hyphens at line ends
    fn char_alignment(
        &self,
        layout: &PageLayout,
        _: &[OcrLine],
        m: &Match,
    ) -> Option<Vec<Rect>> {
        let pattern: Vec<char> = normalize_for_search(&m.raw).chars().collect();
        let first = *pattern.first()?;
        let glyphs = layout.glyphs();

        for start in 0..glyphs.len() {
            if !chars_match(glyphs[start].ch, first) {
                continue;
            }
            if let Some(matched) = align_from(glyphs, start, &pattern) {
                let rects: Vec<Rect> = group_lines(
                    matched.iter().map(|&i| &glyphs[i]),
                    self.line_tolerance,
                )
                .iter()
                .flat_map(|line| word_group_rects(line, self.word_gap_factor))
                .collect();
                if !rects.is_empty() {
                    return Some(rects);
                }
            }
        }

        None
    }

    fn word_sequence(
        &self,
        layout: &PageLayout,
        _: &[OcrLine],
        m: &Match,
    ) -> Option<Vec<Rect>> {
        let tokens: Vec<String> = fold(&m.raw).split(' ').map(str::to_string).collect();
        // Single tokens were already covered by exact search
        if tokens.len() < 2 {
            return None;
        }

        let words = layout.words();
        if words.len() < tokens.len() {
            return None;
        }

        (0..=words.len() - tokens.len()).find_map(|start| {
            let window = &words[start..start + tokens.len()];
            window
                .iter()
                .zip(&tokens)
                .all(|(word, token)| fold(&word.text) == *token)
                .then(|| Rect::bounding(window.iter().map(|w| w.rect)))
                .flatten()
                .map(|rect| vec![rect])
        })
    }

    fn fuzzy_words(
        &self,
        layout: &PageLayout,
        _: &[OcrLine],
        m: &Match,
    ) -> Option<Vec<Rect>> {
        let normalized = fold(&normalize_for_search(&m.raw));
        let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return None;
        }

        let words: Vec<String> = layout.words().iter().map(|w| fold(&w.text)).collect();
        let window = tokens.len() + FUZZY_SLACK;

        for start in 0..words.len() {
            let end = (start + window).min(words.len());
            let mut matched = Vec::with_capacity(tokens.len());
            let mut next_token = 0;

            for (idx, word) in words.iter().enumerate().take(end).skip(start) {
                if next_token == tokens.len() {
                    break;
                }
                if similarity::ratio(word, tokens[next_token]) >= self.min_fuzzy_score {
                    matched.push(idx);
                    next_token += 1;
                } else if matched.is_empty() {
                    break;
                }
            }

            if next_token == tokens.len() {
                let rect = Rect::bounding(matched.iter().map(|&i| layout.words()[i].rect))?;
                return Some(vec![rect]);
            }
        }

        None
    }

    fn ocr_line(&self, _: &PageLayout, lines: &[OcrLine], m: &Match) -> Option<Vec<Rect>> {
        if lines.is_empty() {
            return None;
        }
        ocr_lines::locate_in_lines(&m.raw, lines, self.min_fuzzy_score).map(|rect| vec![rect])
    }
}

/// Indices of the glyphs aligned with `pattern` starting at `start`
fn align_from(glyphs: &[Glyph], start: usize, pattern: &[char]) -> Option<Vec<usize>> {
    let mut matched = Vec::with_capacity(pattern.len());
    let mut g = start;
    let mut p = 0;
    let mut pending: Vec<char> = Vec::new();

    while p < pattern.len() {
        // Ligature glyphs stand for several pattern characters
        if let Some(&next) = pending.first() {
            if !chars_match(next, pattern[p]) {
                return None;
            }
            pending.remove(0);
            p += 1;
            continue;
        }

        let glyph = glyphs.get(g)?;
        let pc = pattern[p];

        if let Some(expanded) = ligature_expansion(glyph.ch) {
            let mut chars = expanded.chars();
            let head = chars.next()?;
            if !chars_match(head, pc) {
                return None;
            }
            pending.extend(chars);
            matched.push(g);
            g += 1;
            p += 1;
        } else if chars_match(glyph.ch, pc) {
            matched.push(g);
            g += 1;
            p += 1;
        } else if glyph.ch.is_whitespace() && !pc.is_whitespace() {
            g += 1;
        } else if pc.is_whitespace() {
            p += 1;
        } else if glyph.ch == '-' && is_line_end(glyphs, g) {
            g += 1;
        } else {
            return None;
        }
    }

    (pending.is_empty() && !matched.is_empty()).then_some(matched)
}

/// Whether the glyph at `idx` is followed only by whitespace before a new line
fn is_line_end(glyphs: &[Glyph], idx: usize) -> bool {
    let y = glyphs[idx].rect.center_y();
    let height = glyphs[idx].rect.height().max(1.0);
    match glyphs[idx + 1..].iter().find(|g| !g.ch.is_whitespace()) {
        Some(next) => (next.rect.center_y() - y).abs() > height / 2.0,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::layout::tests::monospace;
    use super::*;
    use crate::domain::Category;

    fn matched(raw: &str, normalized: &str) -> Match {
        Match {
            category: Category::Email,
            raw: raw.to_string(),
            normalized: normalized.to_string(),
            start: 0,
            end: raw.len(),
            confidence: 0.95,
            context: String::new(),
            valid: Some(true),
        }
    }

    fn localizer() -> Localizer {
        Localizer::default()
    }

    #[test]
    fn test_exact_raw_single_line() {
        let loc = localizer();
        let layout = loc.layout(monospace("Email: ana@example.com"));
        let region = loc
            .locate(&layout, &[], &matched("ana@example.com", "ana@example.com"))
            .unwrap();
        assert_eq!(region.strategy, Strategy::ExactRaw);
        // columns 7..22 at 6 units each, offset 10
        assert_eq!(region.rects, vec![Rect::new(52.0, 20.0, 142.0, 30.0)]);
    }

    #[test]
    fn test_exact_raw_spanning_lines_gives_one_rect_per_line() {
        let loc = localizer();
        let layout = loc.layout(monospace("Calle Mayor\n12 Madrid"));
        let region = loc
            .locate(&layout, &[], &matched("Mayor 12", "Mayor 12"))
            .unwrap();
        assert_eq!(region.rects.len(), 2);
    }

    #[test]
    fn test_exact_normalized_finds_unspaced_value() {
        let loc = localizer();
        let layout = loc.layout(monospace("IBAN ES9121000418450200051332"));
        let region = loc
            .locate(
                &layout,
                &[],
                &matched("ES91 2100 0418 4502 0005 1332", "ES9121000418450200051332"),
            )
            .unwrap();
        assert_eq!(region.strategy, Strategy::ExactNormalized);
        assert_eq!(region.rects.len(), 1);
    }

    #[test]
    fn test_char_alignment_joins_hyphenated_word() {
        let loc = localizer();
        let layout = loc.layout(monospace("Paciente docu-\nmentado"));
        let region = loc
            .locate(&layout, &[], &matched("documentado", "documentado"))
            .unwrap();
        assert_eq!(region.strategy, Strategy::CharAlignment);
        assert_eq!(region.rects.len(), 2);
    }

    #[test]
    fn test_char_alignment_splits_at_wide_gap() {
        let mut glyphs = Vec::new();
        for (i, ch) in "ab".chars().enumerate() {
            let x = i as f32 * 5.0;
            glyphs.push(Glyph::new(ch, Rect::new(x, 0.0, x + 5.0, 10.0)));
        }
        // no space glyph between the two groups, only a visual gap
        for (i, ch) in "cd".chars().enumerate() {
            let x = 50.0 + i as f32 * 5.0;
            glyphs.push(Glyph::new(ch, Rect::new(x, 0.0, x + 5.0, 10.0)));
        }
        let loc = localizer();
        let layout = loc.layout(glyphs);
        let region = loc
            .locate(&layout, &[], &matched("ab cd", "ab cd"))
            .unwrap();
        assert_eq!(region.strategy, Strategy::CharAlignment);
        assert_eq!(
            region.rects,
            vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 0.0, 60.0, 10.0)]
        );
    }

    #[test]
    fn test_fuzzy_tolerates_misread_characters() {
        let loc = localizer();
        let layout = loc.layout(monospace("Titular: Ana Garcla Lopez"));
        let region = loc
            .locate(&layout, &[], &matched("Ana Garcia Lopez", "Ana Garcia Lopez"))
            .unwrap();
        assert_eq!(region.strategy, Strategy::Fuzzy);
        assert_eq!(region.rects.len(), 1);
    }

    #[test]
    fn test_ocr_line_fallback() {
        let loc = localizer();
        let layout = loc.layout(Vec::new());
        let lines = vec![OcrLine {
            text: "Correo: ana@example.com".to_string(),
            rect: Rect::new(0.0, 50.0, 230.0, 60.0),
            stripe_index: Some(1),
        }];
        let region = loc
            .locate(&layout, &lines, &matched("ana@example.com", "ana@example.com"))
            .unwrap();
        assert_eq!(region.strategy, Strategy::OcrLine);
        assert_eq!(region.rects, vec![Rect::new(80.0, 50.0, 230.0, 60.0)]);
    }

    #[test]
    fn test_unlocatable_match() {
        let loc = localizer();
        let layout = loc.layout(monospace("nothing relevant here"));
        assert!(loc
            .locate(&layout, &[], &matched("ana@example.com", "ana@example.com"))
            .is_none());
    }
}
