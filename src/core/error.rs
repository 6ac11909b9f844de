use thiserror::Error;
use uuid::Uuid;

use crate::models::EntityKind;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Reference '{reference}' already used by another {kind}")]
    DuplicateReference { kind: EntityKind, reference: String },

    #[error("Record {kind}/{id} already exists")]
    DuplicateId { kind: EntityKind, id: Uuid },

    #[error("Corrupt record {kind}/{id}: {message}")]
    Corrupt {
        kind: EntityKind,
        id: Uuid,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
