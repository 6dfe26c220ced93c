//! Record store interface.
//!
//! Every call carries the session token and returns typed records. An
//! authorization failure is always reported as `StoreError::Unauthorized`.

pub mod memory;

use async_trait::async_trait;
use common::{CategoryPayload, TransactionFilter, TransactionPayload};
use model::{Category, CategoryId, Transaction, TransactionId, Wallet};
use std::fmt;

use crate::error::StoreResult;
use crate::session::SessionToken;

pub use memory::{MemoryStore, StoreCall, StoreSnapshot};

/// Record types held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Transaction,
    Category,
    Wallet,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Transaction => write!(f, "transaction"),
            ResourceKind::Category => write!(f, "category"),
            ResourceKind::Wallet => write!(f, "wallet"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    List,
    Create,
    Update,
    Delete,
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreAction::List => write!(f, "list"),
            StoreAction::Create => write!(f, "create"),
            StoreAction::Update => write!(f, "update"),
            StoreAction::Delete => write!(f, "delete"),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Lists transactions matching `filter`, newest first.
    async fn list_transactions(
        &self,
        token: &SessionToken,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>>;

    async fn create_transaction(
        &self,
        token: &SessionToken,
        payload: &TransactionPayload,
    ) -> StoreResult<Transaction>;

    async fn update_transaction(
        &self,
        token: &SessionToken,
        id: TransactionId,
        payload: &TransactionPayload,
    ) -> StoreResult<Transaction>;

    async fn delete_transaction(&self, token: &SessionToken, id: TransactionId) -> StoreResult<()>;

    async fn list_categories(&self, token: &SessionToken) -> StoreResult<Vec<Category>>;

    async fn create_category(
        &self,
        token: &SessionToken,
        payload: &CategoryPayload,
    ) -> StoreResult<Category>;

    async fn update_category(
        &self,
        token: &SessionToken,
        id: CategoryId,
        payload: &CategoryPayload,
    ) -> StoreResult<Category>;

    /// Deletes a single category. Descendants are the caller's concern.
    async fn delete_category(&self, token: &SessionToken, id: CategoryId) -> StoreResult<()>;

    async fn list_wallets(&self, token: &SessionToken) -> StoreResult<Vec<Wallet>>;
}
