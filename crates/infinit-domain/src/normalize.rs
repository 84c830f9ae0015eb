//! Basic name folding shared by the store and the resolution engine
//!
//! `fold_name` is the comparison key used for storage-level uniqueness:
//! diacritics folded, lowercased, punctuation stripped, whitespace
//! collapsed. The full normalizer in infinit-core additionally strips
//! configured leading qualifier words on top of this fold.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a name into its diacritics- and case-insensitive comparison form.
///
/// "Šinčchondží" → "sincchondzi", "Hnutí  Hare Kršna" → "hnuti hare krsna".
/// Idempotent; empty input folds to the empty string.
pub fn fold_name(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_ascii() {
                // ASCII punctuation (parentheses, commas, hyphens) separates tokens
                Some(' ')
            } else {
                // Leftover non-ASCII marks (e.g. modifier apostrophes) vanish
                None
            }
        })
        .collect();

    collapse_whitespace(stripped.trim())
}

/// Convert a name to a hyphenated ASCII slug.
///
/// "Hnutí Hare Kršna" → "hnuti-hare-krsna", "Děti Boží" → "deti-bozi".
pub fn slugify(name: &str) -> String {
    fold_name(name).split_whitespace().collect::<Vec<_>>().join("-")
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(c);
            prev_was_space = false;
        }
    }

    result
}
