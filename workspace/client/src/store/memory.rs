//! In-memory record store.
//!
//! Mirrors the rules of the remote store closely enough for the pages and the CLI
//! to run against it. Every call is recorded, and a failure can be queued for the
//! next matching call.

use async_trait::async_trait;
use common::{CategoryPayload, TransactionFilter, TransactionPayload};
use model::{Category, CategoryId, Transaction, TransactionId, Wallet, WalletId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

use super::{RecordStore, ResourceKind, StoreAction};
use crate::error::{StoreError, StoreResult};
use crate::session::SessionToken;

/// Serializable contents of a store.
///
/// Transactions are kept newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl StoreSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One recorded store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreCall {
    pub kind: ResourceKind,
    pub action: StoreAction,
}

impl StoreCall {
    pub fn new(kind: ResourceKind, action: StoreAction) -> Self {
        Self { kind, action }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    data: StoreSnapshot,
    calls: Vec<StoreCall>,
    faults: VecDeque<(StoreCall, StoreError)>,
}

pub struct MemoryStore {
    token: SessionToken,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Empty store accepting only `token`.
    pub fn new(token: SessionToken) -> Self {
        Self::with_snapshot(token, StoreSnapshot::default())
    }

    pub fn with_snapshot(token: SessionToken, snapshot: StoreSnapshot) -> Self {
        info!(
            wallets = snapshot.wallets.len(),
            categories = snapshot.categories.len(),
            transactions = snapshot.transactions.len(),
            "Memory store initialized"
        );
        Self {
            token,
            state: Mutex::new(MemoryState {
                data: snapshot,
                ..MemoryState::default()
            }),
        }
    }

    /// Makes the next call matching `call` fail with `error`.
    pub async fn fail_next(&self, call: StoreCall, error: StoreError) {
        self.state.lock().await.faults.push_back((call, error));
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn count_calls(&self, call: StoreCall) -> usize {
        self.state.lock().await.calls.iter().filter(|c| **c == call).count()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().await.data.clone()
    }

    /// Records the call, checks the token and pops a queued fault.
    async fn begin(
        &self,
        token: &SessionToken,
        kind: ResourceKind,
        action: StoreAction,
    ) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.state.lock().await;
        let call = StoreCall::new(kind, action);
        state.calls.push(call);
        trace!(%kind, %action, "Store call received");

        if *token != self.token {
            warn!(%kind, %action, "Store call with a refused token");
            return Err(StoreError::Unauthorized);
        }
        if let Some(position) = state.faults.iter().position(|(c, _)| *c == call) {
            if let Some((_, error)) = state.faults.remove(position) {
                warn!(%kind, %action, error = %error, "Injected store failure");
                return Err(error);
            }
        }
        Ok(state)
    }
}

impl MemoryState {
    fn check_wallet(&self, wallet: WalletId) -> StoreResult<()> {
        if self.data.wallets.iter().any(|w| w.id == wallet) {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!("Wallet {} does not exist", wallet)))
        }
    }

    fn check_category_ref(&self, category: Option<CategoryId>) -> StoreResult<()> {
        match category {
            Some(id) if !self.data.categories.iter().any(|c| c.id == id) => Err(
                StoreError::Rejected(format!("Category {} does not exist", id)),
            ),
            _ => Ok(()),
        }
    }

    fn check_parent(&self, parent: Option<CategoryId>) -> StoreResult<()> {
        match parent {
            Some(id) if !self.data.categories.iter().any(|c| c.id == id) => Err(
                StoreError::Rejected(format!("Parent category with ID {} not found", id)),
            ),
            _ => Ok(()),
        }
    }

    fn check_transaction(&self, payload: &TransactionPayload) -> StoreResult<()> {
        if !payload.kind.is_known() {
            return Err(StoreError::Rejected("Unknown transaction type".to_string()));
        }
        self.check_wallet(payload.wallet)?;
        self.check_category_ref(payload.category)
    }
}

fn build_transaction(id: TransactionId, payload: &TransactionPayload) -> Transaction {
    Transaction::new(id, payload.kind, payload.amount, payload.date, payload.wallet)
        .with_category(payload.category)
        .with_description(payload.description.clone())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_transactions(
        &self,
        token: &SessionToken,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let state = self
            .begin(token, ResourceKind::Transaction, StoreAction::List)
            .await?;
        let transactions: Vec<Transaction> = state
            .data
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        debug!(count = transactions.len(), ?filter, "Listed transactions");
        Ok(transactions)
    }

    async fn create_transaction(
        &self,
        token: &SessionToken,
        payload: &TransactionPayload,
    ) -> StoreResult<Transaction> {
        let mut state = self
            .begin(token, ResourceKind::Transaction, StoreAction::Create)
            .await?;
        state.check_transaction(payload)?;

        let transaction = build_transaction(TransactionId::new_random(), payload);
        state.data.transactions.insert(0, transaction.clone());
        info!(id = %transaction.id(), "Created transaction");
        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        token: &SessionToken,
        id: TransactionId,
        payload: &TransactionPayload,
    ) -> StoreResult<Transaction> {
        let mut state = self
            .begin(token, ResourceKind::Transaction, StoreAction::Update)
            .await?;
        let position = state
            .data
            .transactions
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| StoreError::not_found(ResourceKind::Transaction, id))?;
        state.check_transaction(payload)?;

        let transaction = build_transaction(id, payload);
        state.data.transactions[position] = transaction.clone();
        info!(%id, "Updated transaction");
        Ok(transaction)
    }

    async fn delete_transaction(&self, token: &SessionToken, id: TransactionId) -> StoreResult<()> {
        let mut state = self
            .begin(token, ResourceKind::Transaction, StoreAction::Delete)
            .await?;
        let position = state
            .data
            .transactions
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| StoreError::not_found(ResourceKind::Transaction, id))?;

        state.data.transactions.remove(position);
        info!(%id, "Deleted transaction");
        Ok(())
    }

    async fn list_categories(&self, token: &SessionToken) -> StoreResult<Vec<Category>> {
        let state = self
            .begin(token, ResourceKind::Category, StoreAction::List)
            .await?;
        debug!(count = state.data.categories.len(), "Listed categories");
        Ok(state.data.categories.clone())
    }

    async fn create_category(
        &self,
        token: &SessionToken,
        payload: &CategoryPayload,
    ) -> StoreResult<Category> {
        let mut state = self
            .begin(token, ResourceKind::Category, StoreAction::Create)
            .await?;
        state.check_parent(payload.parent)?;

        let category = Category {
            id: CategoryId::new_random(),
            title: payload.title.clone(),
            description: payload.description.clone(),
            parent: payload.parent,
        };
        state.data.categories.push(category.clone());
        info!(id = %category.id, title = %category.title, "Created category");
        Ok(category)
    }

    async fn update_category(
        &self,
        token: &SessionToken,
        id: CategoryId,
        payload: &CategoryPayload,
    ) -> StoreResult<Category> {
        let mut state = self
            .begin(token, ResourceKind::Category, StoreAction::Update)
            .await?;
        let position = state
            .data
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(ResourceKind::Category, id))?;
        if payload.parent == Some(id) {
            return Err(StoreError::Rejected(
                "Category cannot be its own parent".to_string(),
            ));
        }
        state.check_parent(payload.parent)?;

        let category = Category {
            id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            parent: payload.parent,
        };
        state.data.categories[position] = category.clone();
        info!(%id, title = %category.title, "Updated category");
        Ok(category)
    }

    async fn delete_category(&self, token: &SessionToken, id: CategoryId) -> StoreResult<()> {
        let mut state = self
            .begin(token, ResourceKind::Category, StoreAction::Delete)
            .await?;
        let position = state
            .data
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found(ResourceKind::Category, id))?;
        let in_use = state
            .data
            .transactions
            .iter()
            .filter(|t| t.category() == Some(id))
            .count();
        if in_use > 0 {
            warn!(%id, in_use, "Refusing to delete category with transactions");
            return Err(StoreError::Rejected(format!(
                "Category is used by {} transaction(s)",
                in_use
            )));
        }

        state.data.categories.remove(position);
        info!(%id, "Deleted category");
        Ok(())
    }

    async fn list_wallets(&self, token: &SessionToken) -> StoreResult<Vec<Wallet>> {
        let state = self
            .begin(token, ResourceKind::Wallet, StoreAction::List)
            .await?;
        debug!(count = state.data.wallets.len(), "Listed wallets");
        Ok(state.data.wallets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::TransactionKind;
    use rust_decimal::Decimal;

    fn token() -> SessionToken {
        SessionToken::new("token")
    }

    fn wallet() -> Wallet {
        Wallet::new(WalletId::new_random(), "Cash")
    }

    fn payload(kind: TransactionKind, amount: i64, wallet: WalletId) -> TransactionPayload {
        TransactionPayload {
            kind,
            amount: Decimal::from(amount),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: None,
            wallet,
        }
    }

    #[tokio::test]
    async fn test_refused_token_is_unauthorized() {
        let store = MemoryStore::new(token());
        let result = store.list_categories(&SessionToken::new("other")).await;
        assert_eq!(result, Err(StoreError::Unauthorized));
        assert_eq!(store.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_transactions_listed_newest_first_and_filtered() {
        let cash = wallet();
        let store = MemoryStore::with_snapshot(
            token(),
            StoreSnapshot {
                wallets: vec![cash.clone()],
                ..StoreSnapshot::default()
            },
        );
        let first = store
            .create_transaction(&token(), &payload(TransactionKind::Income, 100, cash.id))
            .await
            .unwrap();
        let second = store
            .create_transaction(&token(), &payload(TransactionKind::Expense, 40, cash.id))
            .await
            .unwrap();

        let all = store
            .list_transactions(&token(), &TransactionFilter::all())
            .await
            .unwrap();
        let ids: Vec<TransactionId> = all.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![second.id(), first.id()]);

        let income = store
            .list_transactions(&token(), &TransactionFilter::income())
            .await
            .unwrap();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].id(), first.id());
    }

    #[tokio::test]
    async fn test_transaction_requires_existing_wallet() {
        let store = MemoryStore::new(token());
        let result = store
            .create_transaction(
                &token(),
                &payload(TransactionKind::Expense, 5, WalletId::new_random()),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_category_parent_must_exist() {
        let store = MemoryStore::new(token());
        let result = store
            .create_category(
                &token(),
                &CategoryPayload {
                    title: "Groceries".to_string(),
                    description: None,
                    parent: Some(CategoryId::new_random()),
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_category_in_use_cannot_be_deleted() {
        let cash = wallet();
        let food = Category::new(CategoryId::new_random(), "Food");
        let store = MemoryStore::with_snapshot(
            token(),
            StoreSnapshot {
                wallets: vec![cash.clone()],
                categories: vec![food.clone()],
                transactions: vec![],
            },
        );
        let mut spending = payload(TransactionKind::Expense, 10, cash.id);
        spending.category = Some(food.id);
        store.create_transaction(&token(), &spending).await.unwrap();

        let result = store.delete_category(&token(), food.id).await;

        assert_eq!(
            result,
            Err(StoreError::Rejected(
                "Category is used by 1 transaction(s)".to_string()
            ))
        );
        assert_eq!(store.snapshot().await.categories.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_fault_hits_matching_call_once() {
        let store = MemoryStore::new(token());
        let call = StoreCall::new(ResourceKind::Category, StoreAction::List);
        store
            .fail_next(call, StoreError::Transport("offline".to_string()))
            .await;

        // A different call is not affected.
        assert!(store.list_wallets(&token()).await.is_ok());
        assert_eq!(
            store.list_categories(&token()).await,
            Err(StoreError::Transport("offline".to_string()))
        );
        assert!(store.list_categories(&token()).await.is_ok());
        assert_eq!(store.count_calls(call).await, 2);
    }

    #[test]
    fn test_snapshot_accepts_wire_names() {
        let json = r#"{
            "wallets": [{"uuid": "6f1c1d3e-9a55-4a43-8a0e-0d5c7f1a2b3c", "title": "Cash"}],
            "categories": [{"uuid": "1b4e28ba-2fa1-11d2-883f-0016d3cca427", "title": "Food", "description": ""}]
        }"#;
        let snapshot = StoreSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.wallets[0].name, "Cash");
        assert_eq!(snapshot.categories[0].description, None);
        assert!(snapshot.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_kind_survives_mutation_and_write_back() {
        let json = r#"{
            "wallets": [{"id": "6f1c1d3e-9a55-4a43-8a0e-0d5c7f1a2b3c", "name": "Cash"}],
            "transactions": [{
                "id": "0b0e7c52-6a43-4a8b-8f0f-8f5e2f1c9a01",
                "t_type": "TRANSFER",
                "amount": "5.00",
                "date": "2024-03-01",
                "wallet": "6f1c1d3e-9a55-4a43-8a0e-0d5c7f1a2b3c"
            }]
        }"#;
        let store = MemoryStore::with_snapshot(token(), StoreSnapshot::from_json(json).unwrap());

        store
            .create_category(
                &token(),
                &CategoryPayload {
                    title: "Bills".to_string(),
                    description: None,
                    parent: None,
                },
            )
            .await
            .unwrap();

        let written = store.snapshot().await.to_json().unwrap();
        assert!(written.contains("\"TRANSFER\""));
        let reloaded = StoreSnapshot::from_json(&written).unwrap();
        assert_eq!(reloaded.transactions[0].kind(), TransactionKind::Unknown);
        assert_eq!(reloaded.categories.len(), 1);
    }
}
