//! Common transport-layer types shared between the record store client and the
//! page orchestrators.
//!
//! These structs mirror the store's request payloads and list parameters so the
//! client can talk to any store implementation without duplicating shapes.

pub mod money;
pub mod validation;

pub use money::{Locale, NumberFormat, format_amount, format_balance, format_signed};
pub use validation::{CategoryDraft, FieldErrors, FormField, TransactionDraft};

use chrono::NaiveDate;
use model::{CategoryId, Transaction, TransactionKind, WalletId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ===================== Categories =====================

/// Request body for creating or updating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub title: String,
    pub description: Option<String>,
    pub parent: Option<CategoryId>,
}

// ===================== Transactions =====================

/// Request body for creating or updating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    #[serde(rename = "t_type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub category: Option<CategoryId>,
    pub wallet: WalletId,
}

/// Query parameters accepted when listing transactions.
///
/// Filtering is the store's job; the client only forwards these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Only this kind, or every kind when `None`.
    pub kind: Option<TransactionKind>,
    /// Only transactions on this exact date.
    pub date: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Filter that lets every transaction through.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn income() -> Self {
        Self {
            kind: Some(TransactionKind::Income),
            date: None,
        }
    }

    pub fn expense() -> Self {
        Self {
            kind: Some(TransactionKind::Expense),
            date: None,
        }
    }

    /// Returns the same filter restricted to one date.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Renders the filter as store query pairs (`t_type`, `date`).
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(kind) = self.kind {
            pairs.push(("t_type", kind.code().to_string()));
        }
        if let Some(date) = self.date {
            pairs.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }

    /// Evaluates the filter against a record, for store implementations.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.kind.is_none_or(|kind| transaction.kind() == kind)
            && self.date.is_none_or(|date| transaction.date() == date)
    }
}

// ===================== Lists =====================

/// A list response: either a bare array or a paginated object with `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> ListEnvelope<T> {
    /// Unwraps the envelope into the contained records.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Paginated { results } => results,
        }
    }
}
