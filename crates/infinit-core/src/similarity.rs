//! Similarity scoring for resolution and merge grouping
//!
//! The exact algorithm is an implementation choice, not a contract detail,
//! so both callers go through the `Similarity` trait. Inputs are expected
//! to be normalized already (see `NameNormalizer`).

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Scores two strings on a 0-100 scale.
pub trait Similarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Plain normalized Levenshtein ratio over the whole strings.
///
/// Used for movement merge grouping, where word order carries meaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl Similarity for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        if a.is_empty() && b.is_empty() {
            return 0;
        }
        ratio(a, b)
    }
}

/// Order-independent token-set ratio.
///
/// Splits both strings into whitespace-delimited token sets and scores the
/// best of (intersection vs. intersection+rest-of-a, intersection vs.
/// intersection+rest-of-b, the two combined forms against each other). A
/// name whose tokens all appear in a longer text scores 100, which is what
/// makes this suitable for matching names against document bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetRatio;

impl Similarity for TokenSetRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
        let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 0;
        }

        let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
        let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
        let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

        let base = intersection.join(" ");
        let combined_a = join_parts(&base, &only_a);
        let combined_b = join_parts(&base, &only_b);

        let mut best = ratio(&combined_a, &combined_b);
        if !base.is_empty() {
            best = best.max(ratio(&base, &combined_a));
            best = best.max(ratio(&base, &combined_b));
        }
        best
    }
}

fn join_parts(base: &str, rest: &[&str]) -> String {
    if base.is_empty() {
        rest.join(" ")
    } else if rest.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, rest.join(" "))
    }
}

fn ratio(a: &str, b: &str) -> u8 {
    (normalized_levenshtein(a, b) * 100.0).round() as u8
}
