//! Movement deduplication: grouping near-identical movements and merging
//! each group into a single survivor
//!
//! `plan_merges` is read-only and builds the full plan; `apply_merges`
//! executes it group by group, each group in its own transaction, so one
//! failing group never blocks the rest.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt::Write as _;

use infinit_domain::normalize::fold_name;
use infinit_domain::{AliasKind, Movement, MovementId, NewAlias};
use infinit_store::{MergeOutcome, Store};
use petgraph::unionfind::UnionFind;
use tracing::{error, info};

use crate::error::EngineError;
use crate::normalize::NameNormalizer;
use crate::similarity::Similarity;

/// Shorter names must exceed this many characters for substring containment
/// to count as a duplicate signal.
const MIN_SUBSTRING_LEN: usize = 3;

/// Confidence recorded on aliases created from merged-away names.
const MERGE_ALIAS_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct MergeCandidate {
    pub id: MovementId,
    pub name: String,
    /// Similarity to the survivor's name (0-100).
    pub similarity: u8,
}

#[derive(Debug, Clone)]
pub struct MergeGroup {
    pub survivor: MovementId,
    pub survivor_name: String,
    pub losers: Vec<MergeCandidate>,
    pub planned_aliases: Vec<NewAlias>,
}

#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    pub groups: Vec<MergeGroup>,
    /// Number of movements examined.
    pub scanned: usize,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Human-readable summary of the plan, one group per block.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} duplicate group(s) among {} movement(s)",
            self.groups.len(),
            self.scanned
        );
        for group in &self.groups {
            let _ = writeln!(
                out,
                "  keep [{}] {}",
                group.survivor.as_i64(),
                group.survivor_name
            );
            for loser in &group.losers {
                let _ = writeln!(
                    out,
                    "    merge [{}] {} (similarity {})",
                    loser.id.as_i64(),
                    loser.name,
                    loser.similarity
                );
            }
        }
        out
    }
}

/// Totals and per-group failures from executing a plan.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub groups_applied: usize,
    pub outcome: MergeOutcome,
    pub failures: Vec<(MovementId, String)>,
}

pub struct MovementDeduplicator<'a> {
    store: &'a dyn Store,
    normalizer: &'a NameNormalizer,
    similarity: &'a dyn Similarity,
    threshold: u8,
}

impl<'a> MovementDeduplicator<'a> {
    pub fn new(
        store: &'a dyn Store,
        normalizer: &'a NameNormalizer,
        similarity: &'a dyn Similarity,
        threshold: u8,
    ) -> Self {
        Self {
            store,
            normalizer,
            similarity,
            threshold,
        }
    }

    /// Builds the merge plan without writing anything. Duplicate detection
    /// is pairwise (similarity at or above the threshold, or normalized
    /// substring containment) and grouping is transitive.
    pub fn plan_merges(&self) -> Result<MergePlan, EngineError> {
        let movements = self.store.movements()?;
        let scanned = movements.len();
        if movements.len() < 2 {
            return Ok(MergePlan {
                groups: Vec::new(),
                scanned,
            });
        }

        let normalized: Vec<String> = movements
            .iter()
            .map(|m| self.normalizer.normalize(&m.canonical_name))
            .collect();

        let mut sets: UnionFind<usize> = UnionFind::new(movements.len());
        for i in 0..movements.len() {
            for j in (i + 1)..movements.len() {
                if self.is_duplicate_pair(&normalized[i], &normalized[j]) {
                    sets.union(i, j);
                }
            }
        }

        let labels = sets.into_labeling();
        let mut groups: Vec<MergeGroup> = Vec::new();
        let mut seen_roots: Vec<usize> = Vec::new();
        for root in labels.iter().copied() {
            if seen_roots.contains(&root) {
                continue;
            }
            seen_roots.push(root);
            let members: Vec<&Movement> = labels
                .iter()
                .enumerate()
                .filter(|(_, r)| **r == root)
                .map(|(i, _)| &movements[i])
                .collect();
            if members.len() < 2 {
                continue;
            }
            groups.push(self.plan_group(&members)?);
        }

        groups.sort_by_key(|g| g.survivor);
        Ok(MergePlan { groups, scanned })
    }

    /// Executes every group of the plan. Failures are collected instead of
    /// aborting the batch; each group commits or rolls back on its own.
    pub fn apply_merges(&self, plan: &MergePlan) -> MergeReport {
        let mut report = MergeReport::default();
        for group in &plan.groups {
            let losers: Vec<MovementId> = group.losers.iter().map(|l| l.id).collect();
            match self
                .store
                .apply_merge(group.survivor, &losers, &group.planned_aliases)
            {
                Ok(outcome) => {
                    info!(
                        survivor = group.survivor.as_i64(),
                        merged = losers.len(),
                        "merged duplicate group"
                    );
                    report.groups_applied += 1;
                    report.outcome.aliases_created += outcome.aliases_created;
                    report.outcome.aliases_reassigned += outcome.aliases_reassigned;
                    report.outcome.sources_reassigned += outcome.sources_reassigned;
                    report.outcome.movements_deleted += outcome.movements_deleted;
                }
                Err(e) => {
                    error!(
                        survivor = group.survivor.as_i64(),
                        error = %e,
                        "merge group failed, continuing with the rest"
                    );
                    report.failures.push((group.survivor, e.to_string()));
                }
            }
        }
        report
    }

    fn is_duplicate_pair(&self, a: &str, b: &str) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if self.similarity.score(a, b) >= self.threshold {
            return true;
        }
        let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        shorter.chars().count() > MIN_SUBSTRING_LEN && longer.contains(shorter)
    }

    fn plan_group(&self, members: &[&Movement]) -> Result<MergeGroup, EngineError> {
        // Survivor: longest canonical name, then one carrying diacritics,
        // then the lowest id.
        let survivor = members
            .iter()
            .max_by_key(|m| {
                (
                    m.canonical_name.chars().count(),
                    m.has_diacritics(),
                    Reverse(m.id),
                )
            })
            .copied()
            .ok_or_else(|| EngineError::Store(infinit_store::StoreError::Storage(
                "empty merge group".to_string(),
            )))?;

        let survivor_normalized = self.normalizer.normalize(&survivor.canonical_name);
        let mut taken: HashSet<String> = self
            .store
            .aliases_for_movement(survivor.id)?
            .into_iter()
            .map(|a| fold_name(&a.alias))
            .collect();

        let mut losers = Vec::new();
        let mut planned_aliases = Vec::new();
        for member in members {
            if member.id == survivor.id {
                continue;
            }
            let similarity = self.similarity.score(
                &survivor_normalized,
                &self.normalizer.normalize(&member.canonical_name),
            );
            losers.push(MergeCandidate {
                id: member.id,
                name: member.canonical_name.clone(),
                similarity,
            });

            let folded = fold_name(&member.canonical_name);
            if folded.is_empty() || taken.contains(&folded) {
                continue;
            }
            taken.insert(folded);
            planned_aliases.push(NewAlias {
                movement_id: survivor.id,
                alias: member.canonical_name.clone(),
                kind: AliasKind::Variant,
                confidence: Some(MERGE_ALIAS_CONFIDENCE),
            });
        }
        losers.sort_by_key(|l| l.id);

        Ok(MergeGroup {
            survivor: survivor.id,
            survivor_name: survivor.canonical_name.clone(),
            losers,
            planned_aliases,
        })
    }
}
