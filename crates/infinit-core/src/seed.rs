//! Seeding known movements and their aliases from configuration

use std::collections::HashMap;

use infinit_domain::{AliasKind, MovementId, NewAlias, NewMovement};
use infinit_store::{Store, StoreError};
use tracing::{info, warn};

use crate::config::ResolutionConfig;
use crate::error::EngineError;
use crate::normalize::NameNormalizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedStats {
    pub movements_created: usize,
    pub movements_existing: usize,
    pub aliases_created: usize,
    pub aliases_skipped: usize,
}

/// Installs the configured movements and alias table into the store.
/// Safe to run repeatedly: existing rows are counted, not duplicated.
pub fn seed_from_config(
    store: &dyn Store,
    config: &ResolutionConfig,
    normalizer: &NameNormalizer,
) -> Result<SeedStats, EngineError> {
    let mut stats = SeedStats::default();

    let mut by_normalized: HashMap<String, MovementId> = store
        .movements()?
        .into_iter()
        .map(|m| (normalizer.normalize(&m.canonical_name), m.id))
        .collect();

    for name in &config.known_movements {
        let key = normalizer.normalize(name);
        if key.is_empty() {
            warn!(name = name.as_str(), "movement name normalizes to nothing, skipping");
            continue;
        }
        if by_normalized.contains_key(&key) {
            stats.movements_existing += 1;
            continue;
        }
        match store.insert_movement(NewMovement::named(name.clone())) {
            Ok(id) => {
                by_normalized.insert(key, id);
                stats.movements_created += 1;
            }
            // A folded-name collision the normalizer does not see, e.g.
            // differing only in a qualifier word. Treat as existing.
            Err(StoreError::Conflict(_)) => stats.movements_existing += 1,
            Err(e) => return Err(e.into()),
        }
    }

    for (canonical, aliases) in &config.aliases {
        let key = normalizer.normalize(canonical);
        let Some(&movement_id) = by_normalized.get(&key) else {
            warn!(canonical = canonical.as_str(), "alias target is not a known movement, skipping");
            stats.aliases_skipped += aliases.len();
            continue;
        };
        for alias in aliases {
            if alias.trim().is_empty() {
                stats.aliases_skipped += 1;
                continue;
            }
            match store.insert_alias(NewAlias::new(movement_id, alias.clone(), AliasKind::Configured)) {
                Ok(_) => stats.aliases_created += 1,
                Err(StoreError::Conflict(_)) => stats.aliases_skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    info!(
        created = stats.movements_created,
        existing = stats.movements_existing,
        aliases = stats.aliases_created,
        "seeded movements from configuration"
    );
    Ok(stats)
}
