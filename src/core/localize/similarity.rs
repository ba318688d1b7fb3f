//! String similarity on a 0-100 scale
//!
//! `ratio` is the normalized indel similarity `2 * lcs / (len_a + len_b)`;
//! `partial_ratio` is the best `ratio` of the shorter string against every
//! equally long window of the longer one.

/// Indel similarity of two strings, 0-100
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best window similarity and the window's char range in the longer string
pub fn partial_ratio(a: &str, b: &str) -> (f64, std::ops::Range<usize>) {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    partial_ratio_chars(&a, &b)
}

pub(crate) fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Range is into `long`, the longer of the two inputs (`b` on a tie)
pub(crate) fn partial_ratio_chars(a: &[char], b: &[char]) -> (f64, std::ops::Range<usize>) {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return (if long.is_empty() { 100.0 } else { 0.0 }, 0..0);
    }

    let mut best = (0.0, 0..short.len());
    for start in 0..=long.len() - short.len() {
        let window = &long[start..start + short.len()];
        let score = ratio_chars(short, window);
        if score > best.0 {
            best = (score, start..start + short.len());
            if score >= 100.0 {
                break;
            }
        }
    }
    best
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
