//! Form drafts and the validation applied before anything reaches the store.
//!
//! A draft holds raw user input exactly as typed. `validate` either produces the
//! store payload or a set of per-field messages; a draft that fails validation is
//! never sent.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use model::{Category, CategoryId, Transaction, TransactionKind, WalletId};
use rust_decimal::Decimal;
use tracing::debug;
use validator::Validate;

use crate::{CategoryPayload, TransactionPayload};

/// Upper bound (exclusive) of an amount: 12 integer digits, 14 digits in total.
const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

/// Form fields that can carry an inline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Title,
    Description,
    Parent,
    Kind,
    Amount,
    Date,
    Category,
    Wallet,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::Parent => "parent",
            FormField::Kind => "kind",
            FormField::Amount => "amount",
            FormField::Date => "date",
            FormField::Category => "category",
            FormField::Wallet => "wallet",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(FormField::Title),
            "description" => Some(FormField::Description),
            "parent" => Some(FormField::Parent),
            "kind" => Some(FormField::Kind),
            "amount" => Some(FormField::Amount),
            "date" => Some(FormField::Date),
            "category" => Some(FormField::Category),
            "wallet" => Some(FormField::Wallet),
            _ => None,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation messages keyed by field, one message per field.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("{} field(s) failed validation", .entries.len())]
pub struct FieldErrors {
    entries: BTreeMap<FormField, String>,
}

impl FieldErrors {
    /// Records a message for `field`, keeping the first one if already set.
    pub fn add(&mut self, field: FormField, message: impl Into<String>) {
        self.entries.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.entries.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.entries.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn absorb(&mut self, errors: validator::ValidationErrors) {
        for (name, field_errors) in errors.field_errors() {
            let Some(field) = FormField::from_name(&name.to_string()) else {
                continue;
            };
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                self.add(field, message);
            }
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Text limits of the category form.
#[derive(Debug, Validate)]
struct TextFields {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    title: String,
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    description: String,
}

/// Text limits of the transaction form.
#[derive(Debug, Validate)]
struct TransactionText {
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    description: String,
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ===================== Categories =====================

/// Raw input of the category form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryDraft {
    pub title: String,
    pub description: String,
    pub parent: Option<CategoryId>,
}

impl CategoryDraft {
    /// Empty draft for a new category placed under `parent`.
    pub fn child_of(parent: CategoryId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Draft pre-filled from an existing category.
    pub fn from_category(category: &Category) -> Self {
        Self {
            title: category.title.clone(),
            description: category.description.clone().unwrap_or_default(),
            parent: category.parent,
        }
    }

    /// Validates the draft. `editing` is the id of the category being edited, if any.
    pub fn validate(&self, editing: Option<CategoryId>) -> Result<CategoryPayload, FieldErrors> {
        let mut errors = FieldErrors::default();
        let fields = TextFields {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
        };
        if fields.title.is_empty() {
            errors.add(FormField::Title, "Enter a category title");
        }
        if let Err(e) = fields.validate() {
            errors.absorb(e);
        }

        if let (Some(parent), Some(id)) = (self.parent, editing) {
            if parent == id {
                errors.add(FormField::Parent, "Category cannot be its own parent");
            }
        }

        if !errors.is_empty() {
            debug!(fields = errors.len(), "Category draft rejected");
        }

        errors.into_result(CategoryPayload {
            title: fields.title,
            description: optional_text(&fields.description),
            parent: self.parent,
        })
    }
}

// ===================== Transactions =====================

/// Raw input of the transaction form. The amount is kept as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub amount: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub category: Option<CategoryId>,
    pub wallet: Option<WalletId>,
}

impl TransactionDraft {
    /// Defaults of a new transaction: an expense dated `today`.
    pub fn new_expense(today: NaiveDate) -> Self {
        Self {
            kind: TransactionKind::Expense,
            amount: String::new(),
            description: String::new(),
            date: Some(today),
            category: None,
            wallet: None,
        }
    }

    /// Draft pre-filled from an existing transaction.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            kind: transaction.kind(),
            amount: transaction.amount().to_string(),
            description: transaction.description().unwrap_or_default().to_string(),
            date: Some(transaction.date()),
            category: transaction.category(),
            wallet: Some(transaction.wallet()),
        }
    }

    /// Validates the draft into a store payload.
    pub fn validate(&self) -> Result<TransactionPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        if !self.kind.is_known() {
            errors.add(FormField::Kind, "Choose income or expense");
        }

        let amount = match parse_amount(&self.amount) {
            Ok(amount) => Some(amount),
            Err(message) => {
                errors.add(FormField::Amount, message);
                None
            }
        };

        let text = TransactionText {
            description: self.description.trim().to_string(),
        };
        if let Err(e) = text.validate() {
            errors.absorb(e);
        }
        if self.date.is_none() {
            errors.add(FormField::Date, "Choose a date");
        }
        if self.wallet.is_none() {
            errors.add(FormField::Wallet, "Choose a wallet");
        }

        match (amount, self.date, self.wallet) {
            (Some(amount), Some(date), Some(wallet)) if errors.is_empty() => Ok(TransactionPayload {
                kind: self.kind,
                amount,
                description: optional_text(&self.description),
                date,
                category: self.category,
                wallet,
            }),
            _ => {
                debug!(fields = errors.len(), "Transaction draft rejected");
                Err(errors)
            }
        }
    }
}

/// Parses a typed amount. Accepts `,` as the decimal separator.
fn parse_amount(raw: &str) -> Result<Decimal, &'static str> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err("Enter an amount");
    }
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| "Amount must be a number")?
        .normalize();
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than 0");
    }
    if amount.scale() > 2 {
        return Err("Amount can have at most 2 decimal places");
    }
    if amount >= Decimal::from(AMOUNT_LIMIT) {
        return Err("Amount is too large");
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_transaction_draft() -> TransactionDraft {
        let mut draft = TransactionDraft::new_expense(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        draft.amount = "40.00".to_string();
        draft.wallet = Some(WalletId::new_random());
        draft
    }

    #[test]
    fn test_category_title_required() {
        let draft = CategoryDraft {
            title: "   ".to_string(),
            ..Default::default()
        };
        let errors = draft.validate(None).unwrap_err();
        assert_eq!(errors.get(FormField::Title), Some("Enter a category title"));
    }

    #[test]
    fn test_category_title_too_long() {
        let draft = CategoryDraft {
            title: "x".repeat(256),
            ..Default::default()
        };
        let errors = draft.validate(None).unwrap_err();
        assert!(errors.contains(FormField::Title));
    }

    #[test]
    fn test_category_payload_is_trimmed() {
        let parent = CategoryId::new_random();
        let draft = CategoryDraft {
            title: "  Groceries ".to_string(),
            description: "  ".to_string(),
            parent: Some(parent),
        };
        let payload = draft.validate(None).unwrap();
        assert_eq!(payload.title, "Groceries");
        assert_eq!(payload.description, None);
        assert_eq!(payload.parent, Some(parent));
    }

    #[test]
    fn test_category_cannot_be_own_parent() {
        let id = CategoryId::new_random();
        let draft = CategoryDraft {
            title: "Food".to_string(),
            description: String::new(),
            parent: Some(id),
        };
        let errors = draft.validate(Some(id)).unwrap_err();
        assert_eq!(
            errors.get(FormField::Parent),
            Some("Category cannot be its own parent")
        );
    }

    #[test]
    fn test_valid_transaction() {
        let draft = valid_transaction_draft();
        let payload = draft.validate().unwrap();
        assert_eq!(payload.amount, Decimal::new(40, 0));
        assert_eq!(payload.kind, TransactionKind::Expense);
        assert_eq!(payload.description, None);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        for raw in ["0", "0.00", "-5", "-0.01"] {
            let mut draft = valid_transaction_draft();
            draft.amount = raw.to_string();
            let errors = draft.validate().unwrap_err();
            assert_eq!(
                errors.get(FormField::Amount),
                Some("Amount must be greater than 0"),
                "amount {raw}"
            );
        }
    }

    #[test]
    fn test_amount_format_rules() {
        let mut draft = valid_transaction_draft();

        draft.amount = String::new();
        assert_eq!(draft.validate().unwrap_err().get(FormField::Amount), Some("Enter an amount"));

        draft.amount = "abc".to_string();
        assert_eq!(draft.validate().unwrap_err().get(FormField::Amount), Some("Amount must be a number"));

        draft.amount = "1.005".to_string();
        assert!(draft.validate().unwrap_err().contains(FormField::Amount));

        draft.amount = "1000000000000".to_string();
        assert_eq!(draft.validate().unwrap_err().get(FormField::Amount), Some("Amount is too large"));

        draft.amount = "1 234,50".to_string();
        assert_eq!(draft.validate().unwrap().amount, Decimal::new(123450, 2));
    }

    #[test]
    fn test_missing_wallet_and_date() {
        let mut draft = valid_transaction_draft();
        draft.wallet = None;
        draft.date = None;
        let errors = draft.validate().unwrap_err();
        assert!(errors.contains(FormField::Wallet));
        assert!(errors.contains(FormField::Date));
        assert!(!errors.contains(FormField::Amount));
    }

    #[test]
    fn test_transaction_description_too_long() {
        let mut draft = valid_transaction_draft();
        draft.description = "x".repeat(256);
        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.get(FormField::Description),
            Some("Description must be at most 255 characters")
        );

        draft.description = format!("  {}  ", "x".repeat(255));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut draft = valid_transaction_draft();
        draft.kind = TransactionKind::Unknown;
        assert!(draft.validate().unwrap_err().contains(FormField::Kind));
    }

    #[test]
    fn test_draft_round_trips_existing_transaction() {
        let draft = valid_transaction_draft();
        let payload = draft.validate().unwrap();
        let transaction = Transaction::new(
            model::TransactionId::new_random(),
            payload.kind,
            payload.amount,
            payload.date,
            payload.wallet,
        );
        let edited = TransactionDraft::from_transaction(&transaction);
        assert_eq!(edited.amount, "40");
        assert_eq!(edited.wallet, draft.wallet);
    }
}
