use common::FieldErrors;
use compute::ComputeError;
use model::{CategoryId, TransactionId};
use thiserror::Error;

use crate::store::ResourceKind;

/// Failure reported by a record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The session token was missing, expired or refused.
    #[error("Not authorized")]
    Unauthorized,
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },
    /// The store refused the request, with its own explanation.
    #[error("{0}")]
    Rejected(String),
    #[error("Request failed: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn not_found(kind: ResourceKind, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the page orchestrators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The draft failed validation; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    #[error("Could not change {kind}: {message}")]
    Mutation { kind: ResourceKind, message: String },

    #[error("Failed to load {kind}: {message}")]
    Load { kind: ResourceKind, message: String },

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("A change is already being saved")]
    Busy,

    #[error("No form is open")]
    NoActiveForm,

    #[error("No deletion is waiting for confirmation")]
    NoPendingDeletion,

    #[error("Category {0} not found")]
    UnknownCategory(CategoryId),

    #[error("Transaction {0} not found")]
    UnknownTransaction(TransactionId),
}

impl From<ComputeError> for ClientError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::UnknownCategory(id) => ClientError::UnknownCategory(id),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
