//! Entity resolution and deduplication engine
//!
//! Ties together name normalization, the alias index, the four-tier
//! resolver, content identity, and the movement and source deduplicators
//! over a backing store.

pub mod alias_index;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod ingest;
pub mod movement_dedup;
pub mod normalize;
pub mod resolver;
pub mod seed;
pub mod similarity;
pub mod source_dedup;

pub use alias_index::AliasIndex;
pub use config::{ConfigError, ResolutionConfig};
pub use error::EngineError;
pub use fingerprint::{content_fingerprint, normalize_content, same_document};
pub use ingest::{ingest_document, IngestOutcome, IngestRequest};
pub use movement_dedup::{
    MergeCandidate, MergeGroup, MergePlan, MergeReport, MovementDeduplicator,
};
pub use normalize::NameNormalizer;
pub use resolver::{EntityResolver, MatchMethod, Resolution};
pub use seed::{seed_from_config, SeedStats};
pub use similarity::{SequenceRatio, Similarity, TokenSetRatio};
pub use source_dedup::{
    BackfillStats, DedupStats, DuplicateGroup, DuplicateKey, DuplicateReport, SourceDeduplicator,
    VerifyStats,
};
