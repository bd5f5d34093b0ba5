//! Text normalization shared by the term index, the grounder and span detection.
//!
//! Three increasingly lenient forms of a string are used as lookup keys:
//! - exact: trimmed input, unchanged
//! - folded: trimmed and lowercased
//! - normalized: NFKC fold, lowercase, every non-alphanumeric run (dashes,
//!   slashes, punctuation, whitespace) collapsed to a single space

use unicode_normalization::UnicodeNormalization;

pub fn exact_key(s: &str) -> String {
    s.trim().to_string()
}

pub fn fold_case(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Normalize text for lenient matching.
///
/// ```
/// use lexground_recon::normalize::normalize;
///
/// assert_eq!(normalize("Measles-Vaccine"), "measles vaccine");
/// assert_eq!(normalize("  BCG   vaccine, live "), "bcg vaccine live");
/// ```
pub fn normalize(s: &str) -> String {
    let folded: String = s.nfkc().collect();

    let stripped: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    stripped
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of word tokens in the normalized form.
pub fn token_count(s: &str) -> usize {
    normalize(s).split(' ').filter(|t| !t.is_empty()).count()
}
