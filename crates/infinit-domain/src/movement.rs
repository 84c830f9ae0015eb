//! Movement domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MovementId;

/// A canonical movement entity.
///
/// The canonical name is the authoritative display name and may contain
/// diacritics. The population may transiently hold semantic duplicates
/// (different spellings of the same real-world movement) until the
/// movement deduplicator consolidates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub canonical_name: String,
    pub attributes: MovementAttributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Classification and risk attributes carried along as opaque payload.
///
/// The resolution/dedup engine never interprets these; they survive merges
/// on the surviving record unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementAttributes {
    pub category: Option<String>,
    pub description: Option<String>,
    pub origin_country: Option<String>,
    pub established_year: Option<i32>,
    pub active_status: Option<String>,
    pub website: Option<String>,
    pub rating: Option<String>,
    /// Internal risk score 1-5
    pub risk_level: Option<i32>,
}

impl Movement {
    /// Whether the canonical name carries any non-ASCII (diacritic) characters.
    ///
    /// Used by survivor selection: a name with diacritics is considered more
    /// authoritative than its ASCII-folded variant.
    pub fn has_diacritics(&self) -> bool {
        !self.canonical_name.is_ascii()
    }
}

/// Payload for inserting a new movement.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewMovement {
    pub canonical_name: String,
    pub attributes: MovementAttributes,
}

impl NewMovement {
    pub fn named(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            attributes: MovementAttributes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(name: &str) -> Movement {
        Movement {
            id: MovementId(1),
            canonical_name: name.to_string(),
            attributes: MovementAttributes::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_diacritics() {
        assert!(movement("Hnutí Hare Kršna").has_diacritics());
        assert!(!movement("Wicca").has_diacritics());
    }
}
