//! Page orchestrators.
//!
//! Each page owns its loaded collection, its form and its pending deletion, and
//! drives the record store through an explicit [`AppContext`](crate::AppContext).

pub mod categories;
pub mod transactions;

pub use categories::{CategoriesPage, CategoryFormMode, ParentOption};
pub use transactions::{SummaryView, TransactionFormMode, TransactionRow, TransactionsPage};
