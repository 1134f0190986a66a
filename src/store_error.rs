//! Error type for inventory store operations.

use thiserror::Error;

/// Why a store operation was rejected.
///
/// A rejected operation never changes state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No pack found with id: {0}")]
    PackNotFound(String),

    #[error("No category '{category_id}' in pack '{pack_id}'")]
    CategoryNotFound { pack_id: String, category_id: String },

    #[error("No item '{item_id}' in category '{category_id}' of pack '{pack_id}'")]
    ItemNotFound {
        pack_id: String,
        category_id: String,
        item_id: String,
    },

    #[error("No gear item found with id: {0}")]
    GearItemNotFound(String),

    /// Replacement payloads must keep an identifier.
    #[error("Payload has no {0} id")]
    MissingId(&'static str),

    /// The identifier is already taken in the scope the node lives in.
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

impl StoreError {
    pub fn category_not_found(pack_id: &str, category_id: &str) -> Self {
        StoreError::CategoryNotFound {
            pack_id: pack_id.to_string(),
            category_id: category_id.to_string(),
        }
    }

    pub fn item_not_found(pack_id: &str, category_id: &str, item_id: &str) -> Self {
        StoreError::ItemNotFound {
            pack_id: pack_id.to_string(),
            category_id: category_id.to_string(),
            item_id: item_id.to_string(),
        }
    }

    pub fn duplicate(kind: &'static str, id: &str) -> Self {
        StoreError::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        !matches!(self, StoreError::DuplicateId { .. } | StoreError::MissingId(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
