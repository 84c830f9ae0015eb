//! The trait that all storage backends implement

use infinit_domain::{
    Alias, Fingerprint, Movement, MovementId, NewAlias, NewMovement, NewSourceDoc, SourceDoc,
    SourceId,
};

/// Counters returned by a per-group merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub aliases_created: usize,
    pub aliases_reassigned: usize,
    pub sources_reassigned: usize,
    pub movements_deleted: usize,
}

/// CRUD over movements, aliases and documents, plus the group-scoped
/// atomic merge used by the movement deduplicator.
pub trait Store: Send + Sync {
    // --- movements ---

    /// All movements, ordered by id.
    fn movements(&self) -> Result<Vec<Movement>, StoreError>;

    fn movement(&self, id: MovementId) -> Result<Option<Movement>, StoreError>;

    /// Insert a new movement. The backend enforces uniqueness of the folded
    /// canonical name; a folded-name collision is a `Conflict`.
    fn insert_movement(&self, movement: NewMovement) -> Result<MovementId, StoreError>;

    // --- aliases ---

    /// All aliases, ordered by id.
    fn aliases(&self) -> Result<Vec<Alias>, StoreError>;

    fn aliases_for_movement(&self, id: MovementId) -> Result<Vec<Alias>, StoreError>;

    /// Insert an alias; a duplicate folded alias under the same movement is
    /// a `Conflict`.
    fn insert_alias(&self, alias: NewAlias) -> Result<infinit_domain::AliasId, StoreError>;

    // --- documents ---

    /// All documents, ordered by id.
    fn sources(&self) -> Result<Vec<SourceDoc>, StoreError>;

    fn source(&self, id: SourceId) -> Result<Option<SourceDoc>, StoreError>;

    fn source_by_url(&self, url: &str) -> Result<Option<SourceDoc>, StoreError>;

    fn source_by_fingerprint(&self, fp: &Fingerprint) -> Result<Option<SourceDoc>, StoreError>;

    fn insert_source(&self, source: NewSourceDoc) -> Result<SourceId, StoreError>;

    /// Documents that have content but no fingerprint yet, oldest first.
    fn sources_missing_fingerprint(&self, limit: usize) -> Result<Vec<SourceDoc>, StoreError>;

    fn set_fingerprint(&self, id: SourceId, fp: &Fingerprint) -> Result<(), StoreError>;

    /// Delete a document. Dependent quality/analysis rows are removed with
    /// it; the delete must never leave orphans behind.
    fn delete_source(&self, id: SourceId) -> Result<(), StoreError>;

    // --- quality metrics (dependent analytics rows) ---

    fn insert_source_quality(
        &self,
        source: SourceId,
        label: &str,
        score: f64,
    ) -> Result<(), StoreError>;

    fn source_quality_count(&self, source: SourceId) -> Result<usize, StoreError>;

    // --- merge ---

    /// Atomically merge a group: add the given aliases to the survivor,
    /// reassign every document and pre-existing alias of each loser to the
    /// survivor, then delete the losers. Either the whole group commits or
    /// nothing does. Alias reassignments that would collide with an alias
    /// the survivor already holds are dropped with the loser.
    fn apply_merge(
        &self,
        survivor: MovementId,
        losers: &[MovementId],
        new_aliases: &[NewAlias],
    ) -> Result<MergeOutcome, StoreError>;
}

/// Errors from the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("movement not found: {0}")]
    MovementNotFound(MovementId),

    #[error("source not found: {0}")]
    SourceNotFound(SourceId),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}
