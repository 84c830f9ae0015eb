//! Source document deduplication
//!
//! Duplicates are detected by exact URL first, then by content fingerprint
//! among the rest. Within a group the newest document is retained, using
//! publication time when known and creation time otherwise.

use std::collections::BTreeMap;

use infinit_domain::{Fingerprint, SourceDoc, SourceId};
use infinit_store::Store;
use tracing::{debug, error, info, warn};

use crate::error::EngineError;
use crate::fingerprint::content_fingerprint;

const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    pub processed: usize,
    pub updated: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyStats {
    pub checked: usize,
    pub mismatched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateKey {
    Url(String),
    Content(Fingerprint),
}

#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub key: DuplicateKey,
    pub keep: SourceId,
    pub remove: Vec<SourceId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub scanned: usize,
    pub groups_found: usize,
    pub removed: usize,
    pub errors: usize,
}

/// Per-corpus duplicate overview for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    pub total_sources: usize,
    pub missing_fingerprint: usize,
    pub url_groups: usize,
    pub content_groups: usize,
    pub redundant_documents: usize,
}

pub struct SourceDeduplicator<'a> {
    store: &'a dyn Store,
}

impl<'a> SourceDeduplicator<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Computes and stores fingerprints for documents that lack one, in
    /// batches. Idempotent: a second run finds nothing left to do.
    pub fn backfill_fingerprints(&self, batch_size: usize) -> Result<BackfillStats, EngineError> {
        let batch_size = if batch_size == 0 { DEFAULT_BATCH_SIZE } else { batch_size };
        let mut stats = BackfillStats::default();
        loop {
            let batch = self.store.sources_missing_fingerprint(batch_size)?;
            if batch.is_empty() {
                break;
            }
            let updated_before = stats.updated;
            for doc in &batch {
                stats.processed += 1;
                let Some(content) = &doc.content else {
                    continue;
                };
                let fp = content_fingerprint(content);
                match self.store.set_fingerprint(doc.id, &fp) {
                    Ok(()) => stats.updated += 1,
                    Err(e) => {
                        error!(source = doc.id.as_i64(), error = %e, "fingerprint update failed");
                        stats.errors += 1;
                    }
                }
            }
            // Failed rows stay fingerprintless and would be refetched by the
            // next query; stop once a whole pass makes no progress.
            if stats.updated == updated_before {
                break;
            }
            if batch.len() < batch_size {
                break;
            }
        }
        if stats.updated > 0 {
            info!(updated = stats.updated, "backfilled content fingerprints");
        }
        Ok(stats)
    }

    /// Recomputes every stored fingerprint and refreshes any that no longer
    /// match their content.
    pub fn verify_fingerprints(&self) -> Result<VerifyStats, EngineError> {
        let mut stats = VerifyStats::default();
        for doc in self.store.sources()? {
            let (Some(content), Some(stored)) = (&doc.content, &doc.fingerprint) else {
                continue;
            };
            stats.checked += 1;
            let expected = content_fingerprint(content);
            if *stored != expected {
                warn!(
                    source = doc.id.as_i64(),
                    stored = stored.short(),
                    expected = expected.short(),
                    "stale fingerprint, refreshing"
                );
                self.store.set_fingerprint(doc.id, &expected)?;
                stats.mismatched += 1;
            }
        }
        Ok(stats)
    }

    /// Finds all duplicate groups. Backfills missing fingerprints first so
    /// content grouping sees the whole corpus.
    pub fn find_duplicates(&self) -> Result<Vec<DuplicateGroup>, EngineError> {
        self.backfill_fingerprints(DEFAULT_BATCH_SIZE)?;

        let sources = self.checked_sources()?;
        let mut groups = Vec::new();
        let mut grouped: Vec<SourceId> = Vec::new();

        let mut by_url: BTreeMap<&str, Vec<&SourceDoc>> = BTreeMap::new();
        for doc in &sources {
            by_url.entry(doc.url.as_str()).or_default().push(doc);
        }
        for (url, docs) in by_url {
            if docs.len() < 2 {
                continue;
            }
            let (keep, remove) = split_newest(&docs);
            grouped.extend(remove.iter().copied());
            grouped.push(keep);
            groups.push(DuplicateGroup {
                key: DuplicateKey::Url(url.to_string()),
                keep,
                remove,
            });
        }

        let mut by_fingerprint: BTreeMap<&str, Vec<&SourceDoc>> = BTreeMap::new();
        for doc in &sources {
            if grouped.contains(&doc.id) {
                continue;
            }
            if let Some(fp) = &doc.fingerprint {
                by_fingerprint.entry(fp.as_str()).or_default().push(doc);
            }
        }
        for (fp, docs) in by_fingerprint {
            if docs.len() < 2 {
                continue;
            }
            let (keep, remove) = split_newest(&docs);
            groups.push(DuplicateGroup {
                key: DuplicateKey::Content(Fingerprint::from_hex(fp)),
                keep,
                remove,
            });
        }

        Ok(groups)
    }

    /// Deletes the redundant documents of every duplicate group. With
    /// `dry_run` the stats report what would happen without deleting.
    pub fn remove_duplicates(&self, dry_run: bool) -> Result<DedupStats, EngineError> {
        let groups = self.find_duplicates()?;
        let mut stats = DedupStats {
            scanned: self.store.sources()?.len(),
            groups_found: groups.len(),
            ..DedupStats::default()
        };

        for group in &groups {
            for id in &group.remove {
                if dry_run {
                    debug!(source = id.as_i64(), "would delete duplicate");
                    stats.removed += 1;
                    continue;
                }
                match self.store.delete_source(*id) {
                    Ok(()) => stats.removed += 1,
                    Err(e) => {
                        error!(source = id.as_i64(), error = %e, "duplicate delete failed");
                        stats.errors += 1;
                    }
                }
            }
        }

        if !dry_run && stats.removed > 0 {
            info!(removed = stats.removed, groups = stats.groups_found, "removed duplicate documents");
        }
        Ok(stats)
    }

    /// Corpus-wide duplicate statistics, without modifying anything other
    /// than the fingerprint backfill.
    pub fn duplicate_stats(&self) -> Result<DuplicateReport, EngineError> {
        let groups = self.find_duplicates()?;
        let sources = self.store.sources()?;
        let mut report = DuplicateReport {
            total_sources: sources.len(),
            missing_fingerprint: sources.iter().filter(|s| s.fingerprint.is_none()).count(),
            ..DuplicateReport::default()
        };
        for group in &groups {
            match group.key {
                DuplicateKey::Url(_) => report.url_groups += 1,
                DuplicateKey::Content(_) => report.content_groups += 1,
            }
            report.redundant_documents += group.remove.len();
        }
        Ok(report)
    }

    /// All documents whose movement reference is valid. Orphans are logged
    /// and excluded rather than failing the whole pass.
    fn checked_sources(&self) -> Result<Vec<SourceDoc>, EngineError> {
        let movements: Vec<_> = self.store.movements()?.iter().map(|m| m.id).collect();
        let mut sources = Vec::new();
        for doc in self.store.sources()? {
            if let Some(movement_id) = doc.movement_id {
                if !movements.contains(&movement_id) {
                    let err = EngineError::OrphanReference {
                        document: doc.id,
                        movement: movement_id,
                    };
                    error!(error = %err, "skipping orphaned document");
                    continue;
                }
            }
            sources.push(doc);
        }
        Ok(sources)
    }
}

/// Splits a group into the newest document and the rest. Newest by
/// effective timestamp, ties broken by the higher id.
fn split_newest(docs: &[&SourceDoc]) -> (SourceId, Vec<SourceId>) {
    let keep = docs
        .iter()
        .max_by_key(|d| (d.effective_timestamp(), d.id))
        .map(|d| d.id)
        .unwrap_or(docs[0].id);
    let remove = docs.iter().map(|d| d.id).filter(|id| *id != keep).collect();
    (keep, remove)
}
