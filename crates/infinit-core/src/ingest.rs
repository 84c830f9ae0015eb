//! Document ingestion with duplicate gating and movement attribution

use chrono::{DateTime, Utc};
use infinit_domain::{NewSourceDoc, SourceDoc, SourceId};
use infinit_store::Store;
use tracing::{debug, warn};
use url::Url;

use crate::error::EngineError;
use crate::fingerprint::content_fingerprint;
use crate::resolver::{EntityResolver, Resolution};

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub url: String,
    pub title: String,
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum IngestOutcome {
    Inserted {
        id: SourceId,
        resolution: Resolution,
    },
    DuplicateUrl {
        existing: SourceDoc,
    },
    DuplicateContent {
        existing: SourceDoc,
    },
}

/// Stores a new document unless the same URL or the same content already
/// exists, resolving the owning movement from its title and body.
pub fn ingest_document(
    store: &dyn Store,
    resolver: &EntityResolver<'_>,
    request: IngestRequest,
) -> Result<IngestOutcome, EngineError> {
    let url = Url::parse(&request.url)
        .map_err(|e| EngineError::InvalidUrl(format!("{}: {}", request.url, e)))?;

    if let Some(existing) = store.source_by_url(url.as_str())? {
        debug!(url = url.as_str(), existing = existing.id.as_i64(), "duplicate url, skipping");
        return Ok(IngestOutcome::DuplicateUrl { existing });
    }

    let fingerprint = content_fingerprint(&request.text);
    if let Some(existing) = store.source_by_fingerprint(&fingerprint)? {
        warn!(
            url = url.as_str(),
            existing = existing.id.as_i64(),
            fingerprint = fingerprint.short(),
            "identical content already stored under a different url"
        );
        return Ok(IngestOutcome::DuplicateContent { existing });
    }

    let resolution = resolver.resolve(&format!("{} {}", request.title, request.text));
    let id = store.insert_source(NewSourceDoc {
        movement_id: resolution.movement(),
        url: url.to_string(),
        title: Some(request.title),
        content: Some(request.text),
        fingerprint: Some(fingerprint),
        published_at: request.published_at,
    })?;

    Ok(IngestOutcome::Inserted { id, resolution })
}
