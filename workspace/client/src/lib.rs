//! Client core of the finance tracker.
//!
//! Holds the record store interface with an in-memory implementation, the
//! explicit session context and the page orchestrators that drive create, edit
//! and delete workflows for categories and transactions.

pub mod context;
pub mod error;
pub mod form;
pub mod load;
pub mod pages;
pub mod session;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use context::AppContext;
pub use error::{ClientError, Result, StoreError, StoreResult};
pub use form::{DeletionPhase, Form, FormPhase, OpenForm, PendingDeletion};
pub use load::LoadState;
pub use pages::{
    CategoriesPage, CategoryFormMode, ParentOption, SummaryView, TransactionFormMode,
    TransactionRow, TransactionsPage,
};
pub use session::{Session, SessionToken};
pub use settings::ClientSettings;
pub use store::{MemoryStore, RecordStore, ResourceKind, StoreAction, StoreCall, StoreSnapshot};
