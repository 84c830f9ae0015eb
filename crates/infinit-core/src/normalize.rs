//! Name normalization for matching and comparison
//!
//! Builds on the basic fold from infinit-domain and additionally strips
//! configured leading qualifier words ("hnutí", "církev", ...), so that
//! "Hnutí Wicca" and "Wicca" compare equal.

use std::collections::HashSet;

use infinit_domain::normalize::fold_name;

pub use infinit_domain::normalize::slugify;

/// Qualifier words stripped from the front of a name when nothing else
/// of the name would remain. Folded form (no diacritics).
const DEFAULT_QUALIFIER_WORDS: &[&str] = &["hnuti", "cirkev", "sekta", "skupina", "spolecnost"];

/// Canonicalizes raw names and aliases into comparison keys.
///
/// Deterministic and pure; `normalize(normalize(x)) == normalize(x)` for
/// every input, and empty input normalizes to the empty string.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    qualifiers: HashSet<String>,
}

impl NameNormalizer {
    /// Build a normalizer with a configured qualifier word set. The words
    /// themselves are folded, so the configuration may carry diacritics.
    pub fn new<I, S>(qualifier_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let qualifiers = qualifier_words
            .into_iter()
            .map(|w| fold_name(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { qualifiers }
    }

    /// Normalize a name: fold diacritics and case, strip punctuation,
    /// collapse whitespace, then drop leading qualifier tokens as long as
    /// at least one token remains.
    pub fn normalize(&self, name: &str) -> String {
        let folded = fold_name(name);
        let mut tokens: Vec<&str> = folded.split_whitespace().collect();

        while tokens.len() > 1 && self.qualifiers.contains(tokens[0]) {
            tokens.remove(0);
        }

        tokens.join(" ")
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALIFIER_WORDS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Šinčchondží", "sincchondzi" ; "diacritics fold")]
    #[test_case("sincchondzi", "sincchondzi" ; "already folded")]
    #[test_case("Hnutí Wicca", "wicca" ; "movement qualifier stripped")]
    #[test_case("Církev sjednocení", "sjednoceni" ; "church qualifier stripped")]
    #[test_case("Hnutí", "hnuti" ; "bare qualifier survives")]
    #[test_case("", "" ; "empty input")]
    #[test_case("  Děti   Boží  ", "deti bozi" ; "whitespace collapsed")]
    #[test_case("Rodina (Děti Boží)", "rodina deti bozi" ; "punctuation stripped")]
    fn test_normalize(input: &str, expected: &str) {
        assert_eq!(NameNormalizer::default().normalize(input), expected);
    }

    #[test]
    fn test_stacked_qualifiers() {
        let normalizer = NameNormalizer::default();
        assert_eq!(normalizer.normalize("Hnutí Církev Grálu"), "gralu");
    }

    #[test]
    fn test_configured_qualifiers_may_carry_diacritics() {
        let normalizer = NameNormalizer::new(["Hnutí"]);
        assert_eq!(normalizer.normalize("Hnutí Wicca"), "wicca");
        // "církev" was not configured here
        assert_eq!(normalizer.normalize("Církev Wicca"), "cirkev wicca");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = NameNormalizer::default();
        for input in ["Hnutí Hare Kršna", "Šinčchondží", "Rodina (Děti Boží)", ""] {
            let once = normalizer.normalize(input);
            assert_eq!(normalizer.normalize(&once), once, "input: {:?}", input);
        }
    }
}
