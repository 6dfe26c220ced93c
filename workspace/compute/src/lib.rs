//! Pure transforms over the records fetched from the store: the category forest,
//! cascade planning for category deletion, tree view rows and ledger totals.
//!
//! Nothing here performs I/O; every function is re-run from scratch on the latest
//! full collection after each reload.

pub mod cascade;
pub mod error;
pub mod forest;
pub mod ledger;
pub mod view;

pub use cascade::{CascadePlan, plan_cascade};
pub use error::{ComputeError, Result};
pub use forest::{CategoryNode, build_forest, flatten, root_categories};
pub use ledger::{LedgerSummary, aggregate};
pub use view::{TreeRow, visible_rows};
