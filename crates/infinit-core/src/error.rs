use infinit_domain::{MovementId, SourceId};
use infinit_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    // The field is deliberately not named "source": thiserror would wire
    // it up as the error's source() and SourceId is not an Error.
    #[error("document {document} references missing movement {movement}")]
    OrphanReference {
        document: SourceId,
        movement: MovementId,
    },
}
