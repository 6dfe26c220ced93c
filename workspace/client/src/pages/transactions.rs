use chrono::NaiveDate;
use common::{TransactionDraft, TransactionFilter, format_amount, format_balance, format_signed};
use compute::{LedgerSummary, TreeRow, aggregate, build_forest, visible_rows};
use model::{Category, CategoryId, Transaction, TransactionId, TransactionKind, Wallet};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

use crate::context::AppContext;
use crate::error::{ClientError, Result, StoreError};
use crate::form::{Form, PendingDeletion};
use crate::load::LoadState;
use crate::settings::ClientSettings;
use crate::store::{RecordStore, ResourceKind};

pub const EMPTY_MESSAGE: &str = "No transactions";
pub const NO_DESCRIPTION: &str = "No description";
pub const CONFIRM_DELETE: &str = "Delete this transaction?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionFormMode {
    Create,
    Edit { id: TransactionId },
}

impl TransactionFormMode {
    pub fn title(&self) -> &'static str {
        match self {
            TransactionFormMode::Create => "New transaction",
            TransactionFormMode::Edit { .. } => "Edit transaction",
        }
    }
}

/// A transaction ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub description: String,
    pub date: String,
    /// Title of the category, when set and still present.
    pub category: Option<String>,
    pub wallet: Option<String>,
    /// Signed amount, `+` for income and `-` for expense.
    pub amount: String,
}

/// Formatted totals of the loaded ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub count: usize,
}

/// Transactions page: the filtered ledger, its totals and the transaction form.
#[derive(Debug, Default)]
pub struct TransactionsPage {
    filter: TransactionFilter,
    transactions: Vec<Transaction>,
    summary: LedgerSummary,
    categories: Vec<Category>,
    wallets: Vec<Wallet>,
    load_state: LoadState,
    form: Form<TransactionDraft, TransactionFormMode>,
    deletion: Option<PendingDeletion<TransactionId>>,
}

impl TransactionsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> TransactionFilter {
        self.filter
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn summary(&self) -> LedgerSummary {
        self.summary
    }

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn banner(&self) -> Option<&str> {
        self.load_state.error()
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        (self.load_state.is_loaded() && self.transactions.is_empty()).then_some(EMPTY_MESSAGE)
    }

    pub fn form(&self) -> &Form<TransactionDraft, TransactionFormMode> {
        &self.form
    }

    pub fn pending_deletion(&self) -> Option<&PendingDeletion<TransactionId>> {
        self.deletion.as_ref()
    }

    // ===================== Loading =====================

    /// Reloads the ledger for the current filter, with the categories and wallets
    /// it refers to. Nothing is replaced unless every list succeeds.
    #[instrument(skip_all, fields(filter = ?self.filter))]
    pub async fn load<S: RecordStore>(&mut self, ctx: &mut AppContext<S>) -> Result<()> {
        let token = match ctx.token() {
            Ok(token) => token,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        self.load_state = LoadState::Loading;

        let loaded = async {
            let transactions = ctx
                .store
                .list_transactions(&token, &self.filter)
                .await
                .map_err(|e| (ResourceKind::Transaction, e))?;
            let categories = ctx
                .store
                .list_categories(&token)
                .await
                .map_err(|e| (ResourceKind::Category, e))?;
            let wallets = ctx
                .store
                .list_wallets(&token)
                .await
                .map_err(|e| (ResourceKind::Wallet, e))?;
            Ok::<_, (ResourceKind, StoreError)>((transactions, categories, wallets))
        }
        .await;

        match loaded {
            Ok((transactions, categories, wallets)) => {
                self.summary = aggregate(&transactions);
                info!(
                    count = transactions.len(),
                    balance = %self.summary.balance,
                    "Transactions loaded"
                );
                self.transactions = transactions;
                self.categories = categories;
                self.wallets = wallets;
                self.load_state = LoadState::Loaded;
                Ok(())
            }
            Err((kind, err)) => {
                if ctx.absorb_auth_failure(&err) {
                    self.reset();
                    return Err(ClientError::SessionExpired);
                }
                error!(%kind, error = %err, "Failed to load transactions page");
                self.load_state = LoadState::Failed(err.to_string());
                Err(ClientError::Load {
                    kind,
                    message: err.to_string(),
                })
            }
        }
    }

    /// Switches the filter and reloads from the store.
    pub async fn set_filter<S: RecordStore>(
        &mut self,
        ctx: &mut AppContext<S>,
        filter: TransactionFilter,
    ) -> Result<()> {
        debug!(?filter, "Filter changed");
        self.filter = filter;
        self.load(ctx).await
    }

    fn reset(&mut self) {
        debug!("Resetting transactions page");
        *self = Self::default();
    }

    fn find(&self, id: TransactionId) -> Result<&Transaction> {
        self.transactions
            .iter()
            .find(|t| t.id() == id)
            .ok_or(ClientError::UnknownTransaction(id))
    }

    // ===================== Display =====================

    pub fn rows(&self, settings: &ClientSettings) -> Vec<TransactionRow> {
        let number_format = settings.number_format();
        self.transactions
            .iter()
            .map(|t| TransactionRow {
                id: t.id(),
                kind: t.kind(),
                description: t.description().unwrap_or(NO_DESCRIPTION).to_string(),
                date: t.date().format(&settings.date_format).to_string(),
                category: t.category().and_then(|id| self.category_title(id)),
                wallet: self
                    .wallets
                    .iter()
                    .find(|w| w.id == t.wallet())
                    .map(|w| w.name.clone()),
                amount: match t.kind() {
                    TransactionKind::Income => format_signed(t.amount(), true, &number_format),
                    TransactionKind::Expense => format_signed(t.amount(), false, &number_format),
                    TransactionKind::Unknown => format_amount(t.amount(), &number_format),
                },
            })
            .collect()
    }

    fn category_title(&self, id: CategoryId) -> Option<String> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.title.clone())
    }

    pub fn summary_view(&self, settings: &ClientSettings) -> SummaryView {
        let number_format = settings.number_format();
        SummaryView {
            income: format_signed(self.summary.total_income, true, &number_format),
            expense: format_signed(self.summary.total_expense, false, &number_format),
            balance: format_balance(self.summary.balance, &number_format),
            count: self.summary.transaction_count,
        }
    }

    /// Categories for the form's selector, in tree order with their depth.
    pub fn category_options(&self) -> Vec<TreeRow> {
        let forest = build_forest(&self.categories);
        let all: HashSet<CategoryId> = self.categories.iter().map(|c| c.id).collect();
        visible_rows(&forest, &all)
    }

    // ===================== Form =====================

    /// Opens an empty expense dated `today`.
    pub fn open_create(&mut self, today: NaiveDate) -> Result<()> {
        let mut draft = TransactionDraft::new_expense(today);
        if let [only] = self.wallets.as_slice() {
            draft.wallet = Some(only.id);
        }
        self.form.open(TransactionFormMode::Create, draft)
    }

    pub fn open_edit(&mut self, id: TransactionId) -> Result<()> {
        let draft = TransactionDraft::from_transaction(self.find(id)?);
        self.form.open(TransactionFormMode::Edit { id }, draft)
    }

    pub fn draft_mut(&mut self) -> Result<&mut TransactionDraft> {
        self.form.draft_mut()
    }

    pub fn cancel_form(&mut self) -> Result<()> {
        self.form.close()
    }

    /// Validates and submits the open form, then reloads the ledger.
    #[instrument(skip_all)]
    pub async fn save<S: RecordStore>(&mut self, ctx: &mut AppContext<S>) -> Result<()> {
        let open = self.form.editing()?;
        let mode = open.mode;
        let payload = match open.draft.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                self.form.reject(errors.clone());
                return Err(ClientError::Validation(errors));
            }
        };
        let token = match ctx.token() {
            Ok(token) => token,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };

        self.form.begin_save()?;
        let result = match mode {
            TransactionFormMode::Edit { id } => {
                debug!(%id, "Updating transaction");
                ctx.store.update_transaction(&token, id, &payload).await
            }
            TransactionFormMode::Create => {
                debug!(kind = %payload.kind, amount = %payload.amount, "Creating transaction");
                ctx.store.create_transaction(&token, &payload).await
            }
        };

        match result {
            Ok(transaction) => {
                info!(id = %transaction.id(), "Transaction saved");
                self.form.finish();
                self.load(ctx).await
            }
            Err(err) => {
                if ctx.absorb_auth_failure(&err) {
                    self.reset();
                    return Err(ClientError::SessionExpired);
                }
                warn!(error = %err, "Failed to save transaction");
                self.form.fail(err.to_string());
                Err(ClientError::Mutation {
                    kind: ResourceKind::Transaction,
                    message: err.to_string(),
                })
            }
        }
    }

    // ===================== Deletion =====================

    pub fn request_delete(&mut self, id: TransactionId) -> Result<()> {
        if self.deletion.as_ref().is_some_and(|d| d.is_deleting()) {
            return Err(ClientError::Busy);
        }
        self.find(id)?;
        self.deletion = Some(PendingDeletion::new(id));
        Ok(())
    }

    pub fn confirmation_message(&self) -> Option<&'static str> {
        self.deletion.as_ref().map(|_| CONFIRM_DELETE)
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        match &self.deletion {
            None => Err(ClientError::NoPendingDeletion),
            Some(pending) if pending.is_deleting() => Err(ClientError::Busy),
            Some(_) => {
                self.deletion = None;
                Ok(())
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn confirm_delete<S: RecordStore>(&mut self, ctx: &mut AppContext<S>) -> Result<()> {
        if self.deletion.is_none() {
            return Err(ClientError::NoPendingDeletion);
        }
        let token = match ctx.token() {
            Ok(token) => token,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        let pending = self.deletion.as_mut().ok_or(ClientError::NoPendingDeletion)?;
        pending.begin()?;
        let id = *pending.subject();

        match ctx.store.delete_transaction(&token, id).await {
            Ok(()) => {
                info!(%id, "Transaction deleted");
                self.deletion = None;
                self.load(ctx).await
            }
            Err(err) => {
                if ctx.absorb_auth_failure(&err) {
                    self.reset();
                    return Err(ClientError::SessionExpired);
                }
                warn!(%id, error = %err, "Failed to delete transaction");
                self.deletion = Some(PendingDeletion::new(id).with_error(err.to_string()));
                Err(ClientError::Mutation {
                    kind: ResourceKind::Transaction,
                    message: err.to_string(),
                })
            }
        }
    }
}
