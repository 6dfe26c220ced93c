pub mod categories;
pub mod transactions;
pub mod workspace;

pub use categories::{add_category, delete_category, list_categories};
pub use transactions::{TransactionInput, add_transaction, list_transactions, show_summary};
pub use workspace::Workspace;

use anyhow::anyhow;
use client::ClientError;
use std::io::Write;

/// Prints what the user needs to see about a failed operation and turns it into
/// the command's error.
pub(crate) fn report<W: Write>(err: ClientError, out: &mut W) -> anyhow::Error {
    if let ClientError::Validation(errors) = &err {
        for (field, message) in errors.iter() {
            if let Err(write_err) = writeln!(out, "  {}: {}", field, message) {
                return anyhow::Error::new(write_err).context("Could not print validation errors");
            }
        }
        return anyhow!("Input rejected, nothing was saved");
    }
    if err == ClientError::SessionExpired {
        return anyhow!("Session is no longer valid. Sign in again and update the session token.");
    }
    err.into()
}
