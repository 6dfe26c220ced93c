//! Domain entities of the finance tracker: categories, transactions and wallets.
//!
//! These types mirror the records held by the remote record store. They carry no
//! behaviour beyond accessors; tree building and aggregation live in `compute`.

pub mod category;
pub mod ids;
pub mod transaction;
pub mod wallet;

pub use category::Category;
pub use ids::{CategoryId, TransactionId, WalletId};
pub use transaction::{Transaction, TransactionKind};
pub use wallet::Wallet;

// Re-export tracing for use in this crate
pub use tracing;
