//! Combined alias lookup over configured and stored names
//!
//! The index is a point-in-time snapshot. Callers rebuild it after writes
//! that add movements or aliases.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use infinit_domain::MovementId;
use infinit_store::Store;
use tracing::warn;

use crate::config::ResolutionConfig;
use crate::error::EngineError;
use crate::normalize::NameNormalizer;

#[derive(Debug, Default)]
pub struct AliasIndex {
    /// Normalized name or alias to owning movement. Store entries take
    /// precedence over configured ones on conflict.
    exact: HashMap<String, MovementId>,
    /// Verbatim canonical names, for substring matching.
    canonical: Vec<(MovementId, String)>,
    /// Verbatim aliases, for substring matching.
    aliases: Vec<(MovementId, String)>,
}

impl AliasIndex {
    pub fn build(
        config: &ResolutionConfig,
        store: &dyn Store,
        normalizer: &NameNormalizer,
    ) -> Result<Self, EngineError> {
        let mut index = Self::default();

        for movement in store.movements()? {
            let key = normalizer.normalize(&movement.canonical_name);
            if key.is_empty() {
                continue;
            }
            index.insert_exact(key, movement.id, "canonical name");
            index.canonical.push((movement.id, movement.canonical_name));
        }

        for alias in store.aliases()? {
            let key = normalizer.normalize(&alias.alias);
            if key.is_empty() {
                continue;
            }
            index.insert_exact(key, alias.movement_id, "stored alias");
            index.aliases.push((alias.movement_id, alias.alias));
        }

        for (canonical, names) in &config.aliases {
            let canonical_key = normalizer.normalize(canonical);
            let Some(&movement_id) = index.exact.get(&canonical_key) else {
                warn!(canonical, "configured alias target is not a known movement, skipping");
                continue;
            };
            for name in names {
                let key = normalizer.normalize(name);
                if key.is_empty() {
                    continue;
                }
                match index.exact.entry(key) {
                    Entry::Occupied(existing) if *existing.get() != movement_id => {
                        warn!(
                            alias = name.as_str(),
                            stored = existing.get().as_i64(),
                            configured = movement_id.as_i64(),
                            "configured alias conflicts with stored mapping, keeping stored"
                        );
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(movement_id);
                        index.aliases.push((movement_id, name.clone()));
                    }
                }
            }
        }

        Ok(index)
    }

    fn insert_exact(&mut self, key: String, movement_id: MovementId, kind: &str) {
        match self.exact.entry(key) {
            Entry::Occupied(existing) if *existing.get() != movement_id => {
                warn!(
                    kept = existing.get().as_i64(),
                    dropped = movement_id.as_i64(),
                    kind,
                    "normalized name collision, keeping first mapping"
                );
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(movement_id);
            }
        }
    }

    /// Looks up an already-normalized name.
    pub fn lookup_exact(&self, normalized: &str) -> Option<MovementId> {
        self.exact.get(normalized).copied()
    }

    pub fn canonical_names(&self) -> &[(MovementId, String)] {
        &self.canonical
    }

    pub fn alias_names(&self) -> &[(MovementId, String)] {
        &self.aliases
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty() && self.aliases.is_empty()
    }
}
