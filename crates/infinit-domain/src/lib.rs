//! Domain types shared across the infinit movement database
//!
//! This crate provides the canonical data model for movement monitoring:
//! - Movement: one religious movement/sect with a canonical display name
//! - Alias: an alternate name string bound to exactly one movement
//! - SourceDoc: a scraped or imported document owned by a movement
//! - Fingerprint: a content digest used for duplicate detection

pub mod alias;
pub mod fingerprint;
pub mod ids;
pub mod movement;
pub mod normalize;
pub mod source;

pub use alias::*;
pub use fingerprint::*;
pub use ids::*;
pub use movement::*;
pub use source::*;
