//! Alias domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AliasId, MovementId};

/// An alternate name known to refer to a movement.
///
/// Owned exclusively by its movement: cascade-deleted with it, except
/// during a merge where ownership is explicitly reassigned to the survivor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub id: AliasId,
    pub movement_id: MovementId,
    pub alias: String,
    pub kind: AliasKind,
    /// Fuzzy matching confidence that produced this alias, if any (0.0-1.0).
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// How an alias came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasKind {
    /// Seeded from the static configuration table
    Configured,
    /// Created from a fuzzy resolution hit
    Resolved,
    /// A merged-away movement's former canonical name
    Variant,
}

impl AliasKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AliasKind::Configured => "configured",
            AliasKind::Resolved => "resolved",
            AliasKind::Variant => "variant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "configured" => Some(AliasKind::Configured),
            "resolved" => Some(AliasKind::Resolved),
            "variant" => Some(AliasKind::Variant),
            _ => None,
        }
    }
}

/// Payload for inserting a new alias.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAlias {
    pub movement_id: MovementId,
    pub alias: String,
    pub kind: AliasKind,
    pub confidence: Option<f64>,
}

impl NewAlias {
    pub fn new(movement_id: MovementId, alias: impl Into<String>, kind: AliasKind) -> Self {
        Self {
            movement_id,
            alias: alias.into(),
            kind,
            confidence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [AliasKind::Configured, AliasKind::Resolved, AliasKind::Variant] {
            assert_eq!(AliasKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AliasKind::parse("bogus"), None);
    }
}
