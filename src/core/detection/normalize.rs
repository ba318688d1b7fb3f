//! Text normalization
//!
//! Canonicalizes extracted text before detection so that offsets, matching and
//! localization all work on the same string. The normalizer:
//!
//! 1. repairs UTF-8 text that was decoded as Windows-1252/Latin-1 (`cafÃ©` → `café`)
//! 2. expands typographic ligatures (`ﬁ` → `fi`)
//! 3. joins words hyphenated across a line break (`docu-\nment` → `document`)
//! 4. collapses whitespace runs to one space and trims the ends
//!
//! The whole pass is repeated until the text stops changing, which makes
//! [`normalize`] idempotent.

use crate::domain::Category;

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "ft"),
    ('\u{FB06}', "st"),
];

/// Normalize extracted text
///
/// Returns an empty string for empty input.
///
/// # Example
///
/// ```
/// use redline::core::detection::normalize::normalize;
///
/// assert_eq!(normalize("  con\u{FB01}rma-\nción   de   pago "), "confirmación de pago");
/// ```
pub fn normalize(text: &str) -> String {
    // Every pass that changes the text shortens it once ligatures are gone,
    // so the loop reaches a fixed point
    let mut current = normalize_pass(text);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Normalization applied to values before they are searched on a page
///
/// Identical to [`normalize`]; kept separate so both sides of a search can be
/// reasoned about independently.
pub fn normalize_for_search(text: &str) -> String {
    normalize(text)
}

/// Normalize a matched value, then strip whitespace and hyphens from
/// identifier-like categories
pub fn normalize_for_validation(value: &str, category: Category) -> String {
    let value = normalize(value);
    match category {
        Category::Iban
        | Category::CreditCard
        | Category::Dni
        | Category::Nie
        | Category::Cif
        | Category::Phone => value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect(),
        _ => value,
    }
}

fn normalize_pass(text: &str) -> String {
    let repaired = repair_encoding(text);
    let expanded = expand_ligatures(&repaired);
    let joined = join_hyphenated(&expanded);
    collapse_whitespace(&joined)
}

/// Letters a typographic ligature stands for
pub fn ligature_expansion(ch: char) -> Option<&'static str> {
    LIGATURES
        .iter()
        .find(|(lig, _)| *lig == ch)
        .map(|(_, replacement)| *replacement)
}

fn expand_ligatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ligature_expansion(ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

fn join_hyphenated(text: &str) -> String {
    text.replace("-\r\n", "").replace("-\n", "")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte a character had in Windows-1252, for characters outside ASCII
fn cp1252_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        c if ('\u{0080}'..='\u{00FF}').contains(&c) => c as u32 as u8,
        _ => return None,
    };
    Some(byte)
}

/// Length of a UTF-8 sequence introduced by `lead`, for multi-byte leads only
fn utf8_sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Repair mojibake produced by decoding UTF-8 bytes as Windows-1252
///
/// Only runs of characters that map back to single bytes are considered, and
/// a sequence is replaced only when its bytes form valid UTF-8. Text that was
/// correctly decoded is left alone.
fn repair_encoding(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let lead = match cp1252_byte(chars[i]).and_then(|b| utf8_sequence_len(b).map(|n| (b, n)))
        {
            Some(pair) => pair,
            None => {
                out.push(chars[i]);
                i += 1;
                continue;
            }
        };
        let (lead_byte, len) = lead;

        if i + len <= chars.len() {
            let mut bytes = Vec::with_capacity(len);
            bytes.push(lead_byte);
            for ch in &chars[i + 1..i + len] {
                match cp1252_byte(*ch) {
                    Some(b) if (0x80..=0xBF).contains(&b) => bytes.push(b),
                    _ => break,
                }
            }
            if bytes.len() == len {
                if let Ok(decoded) = std::str::from_utf8(&bytes) {
                    out.push_str(decoded);
                    i += len;
                    continue;
                }
            }
        }

        out.push(chars[i]);
        i += 1;
    }

    out
}
