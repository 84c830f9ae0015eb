//! Four-tier entity resolution of free text to a known movement
//!
//! Tiers, in order: verbatim canonical-name substring, verbatim alias
//! substring, fuzzy match against canonical names, fuzzy match against
//! aliases. The first tier that produces a hit decides.

use std::cmp::Reverse;

use infinit_domain::MovementId;
use serde::Serialize;
use tracing::debug;

use crate::alias_index::AliasIndex;
use crate::normalize::NameNormalizer;
use crate::similarity::Similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    CanonicalSubstring,
    AliasSubstring,
    FuzzyCanonical,
    FuzzyAlias,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        movement: MovementId,
        method: MatchMethod,
        score: u8,
    },
    NotFound,
}

impl Resolution {
    pub fn movement(&self) -> Option<MovementId> {
        match self {
            Resolution::Found { movement, .. } => Some(*movement),
            Resolution::NotFound => None,
        }
    }
}

pub struct EntityResolver<'a> {
    index: &'a AliasIndex,
    normalizer: &'a NameNormalizer,
    similarity: &'a dyn Similarity,
    min_fuzzy_score: u8,
}

impl<'a> EntityResolver<'a> {
    pub fn new(
        index: &'a AliasIndex,
        normalizer: &'a NameNormalizer,
        similarity: &'a dyn Similarity,
        min_fuzzy_score: u8,
    ) -> Self {
        Self {
            index,
            normalizer,
            similarity,
            min_fuzzy_score,
        }
    }

    pub fn resolve(&self, text: &str) -> Resolution {
        if text.trim().is_empty() {
            return Resolution::NotFound;
        }

        if let Some((movement, _)) = substring_match(text, self.index.canonical_names()) {
            debug!(movement = movement.as_i64(), "matched canonical name substring");
            return Resolution::Found {
                movement,
                method: MatchMethod::CanonicalSubstring,
                score: 100,
            };
        }

        if let Some((movement, _)) = substring_match(text, self.index.alias_names()) {
            debug!(movement = movement.as_i64(), "matched alias substring");
            return Resolution::Found {
                movement,
                method: MatchMethod::AliasSubstring,
                score: 100,
            };
        }

        let normalized_text = self.normalizer.normalize(text);
        if normalized_text.is_empty() {
            return Resolution::NotFound;
        }

        if let Some((movement, score)) =
            self.fuzzy_match(&normalized_text, self.index.canonical_names())
        {
            debug!(movement = movement.as_i64(), score, "fuzzy canonical match");
            return Resolution::Found {
                movement,
                method: MatchMethod::FuzzyCanonical,
                score,
            };
        }

        if let Some((movement, score)) =
            self.fuzzy_match(&normalized_text, self.index.alias_names())
        {
            debug!(movement = movement.as_i64(), score, "fuzzy alias match");
            return Resolution::Found {
                movement,
                method: MatchMethod::FuzzyAlias,
                score,
            };
        }

        Resolution::NotFound
    }

    fn fuzzy_match(
        &self,
        normalized_text: &str,
        candidates: &[(MovementId, String)],
    ) -> Option<(MovementId, u8)> {
        candidates
            .iter()
            .map(|(id, name)| {
                let score = self
                    .similarity
                    .score(normalized_text, &self.normalizer.normalize(name));
                (*id, name, score)
            })
            .filter(|(_, _, score)| *score >= self.min_fuzzy_score)
            .max_by_key(|(id, name, score)| (*score, name.chars().count(), Reverse(*id)))
            .map(|(id, _, score)| (id, score))
    }
}

/// Case-sensitive verbatim substring search. On multiple hits the longest
/// name wins, then the lowest movement id.
fn substring_match(text: &str, candidates: &[(MovementId, String)]) -> Option<(MovementId, u8)> {
    candidates
        .iter()
        .filter(|(_, name)| !name.is_empty() && text.contains(name.as_str()))
        .max_by_key(|(id, name)| (name.chars().count(), Reverse(*id)))
        .map(|(id, _)| (*id, 100))
}
