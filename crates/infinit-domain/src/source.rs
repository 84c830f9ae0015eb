//! SourceDoc domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::ids::{MovementId, SourceId};

/// A unit of scraped or imported content.
///
/// Immutable once stored, aside from fingerprint backfill. The movement
/// link is non-owning: many documents reference one movement, and a merge
/// reassigns them to the survivor before the loser is removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceDoc {
    pub id: SourceId,
    /// Owning movement; None for documents not yet matched to any movement.
    pub movement_id: Option<MovementId>,
    /// Origin URL, expected unique per ingestion channel.
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub fingerprint: Option<Fingerprint>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SourceDoc {
    /// The timestamp used when selecting which duplicate to retain:
    /// publication time when known, creation time otherwise.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// Payload for inserting a new document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSourceDoc {
    pub movement_id: Option<MovementId>,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub fingerprint: Option<Fingerprint>,
    pub published_at: Option<DateTime<Utc>>,
}
