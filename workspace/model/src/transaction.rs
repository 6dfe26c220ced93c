use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::category::empty_as_none;
use crate::ids::{CategoryId, TransactionId, WalletId};

/// Direction of a transaction.
///
/// On the wire the store uses the short codes `IN` and `EX`; the long names are
/// accepted too. Anything else decodes as [`TransactionKind::Unknown`], which is never
/// counted towards income or expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "IN", alias = "INCOME")]
    Income,
    #[serde(rename = "EX", alias = "EXPENSE")]
    Expense,
    #[serde(other, skip_serializing)]
    Unknown,
}

impl TransactionKind {
    /// Short store code used in payloads and list filters.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Income => "IN",
            TransactionKind::Expense => "EX",
            TransactionKind::Unknown => "??",
        }
    }

    /// Decodes a store code the same way deserialization does.
    pub fn from_code(code: &str) -> Self {
        match code {
            "IN" | "INCOME" => TransactionKind::Income,
            "EX" | "EXPENSE" => TransactionKind::Expense,
            _ => TransactionKind::Unknown,
        }
    }

    /// Whether the kind is one the ledger knows how to count.
    pub fn is_known(&self) -> bool {
        !matches!(self, TransactionKind::Unknown)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
            TransactionKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Error returned when a kind name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction kind '{0}', expected income or expense")]
pub struct ParseKindError(pub String);

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "income" => Ok(TransactionKind::Income),
            "ex" | "expense" => Ok(TransactionKind::Expense),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Kind of a stored transaction. A code this client does not know is kept as
/// received so the record is written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredKind {
    kind: TransactionKind,
    unknown_code: Option<String>,
}

impl From<TransactionKind> for StoredKind {
    fn from(kind: TransactionKind) -> Self {
        Self {
            kind,
            unknown_code: None,
        }
    }
}

impl Serialize for StoredKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.unknown_code {
            Some(code) => serializer.serialize_str(code),
            None => serializer.serialize_str(self.kind.code()),
        }
    }
}

impl<'de> Deserialize<'de> for StoredKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        let kind = TransactionKind::from_code(&code);
        let unknown_code = (!kind.is_known()).then_some(code);
        Ok(Self { kind, unknown_code })
    }
}

/// Represents a single recorded transaction.
///
/// `amount` is always stored as a positive magnitude; the direction is carried by
/// `kind`. The category link is optional, the wallet link is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(alias = "uuid")]
    id: TransactionId,
    #[serde(rename = "t_type", alias = "kind")]
    kind: StoredKind,
    amount: Decimal,
    #[serde(default, deserialize_with = "empty_as_none")]
    description: Option<String>,
    date: NaiveDate,
    #[serde(default)]
    category: Option<CategoryId>,
    wallet: WalletId,
}

impl Transaction {
    /// Creates a new Transaction without category or description.
    pub fn new(
        id: TransactionId,
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        wallet: WalletId,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            amount,
            description: None,
            date,
            category: None,
            wallet,
        }
    }

    /// Returns the same transaction assigned to a category.
    pub fn with_category(mut self, category: Option<CategoryId>) -> Self {
        self.category = category;
        self
    }

    /// Returns the same transaction with a description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Gets the identifier of the transaction.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Gets the kind (income or expense) of the transaction.
    pub fn kind(&self) -> TransactionKind {
        self.kind.kind
    }

    /// Gets the amount of the transaction.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Gets the free-form description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Gets the date of the transaction.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Gets the category the transaction is assigned to.
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    /// Gets the wallet the transaction belongs to.
    pub fn wallet(&self) -> WalletId {
        self.wallet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 15).unwrap();
        let amount = Decimal::new(10000, 2); // 100.00
        let wallet = WalletId::new_random();

        let transaction = Transaction::new(
            TransactionId::new_random(),
            TransactionKind::Income,
            amount,
            date,
            wallet,
        );

        assert_eq!(transaction.date(), date);
        assert_eq!(transaction.amount(), amount);
        assert_eq!(transaction.wallet(), wallet);
        assert_eq!(transaction.kind(), TransactionKind::Income);
        assert!(transaction.category().is_none());
        assert!(transaction.description().is_none());
    }

    #[test]
    fn test_deserialize_store_record() {
        let json = r#"{
            "uuid": "0b0e7c52-6a43-4a8b-8f0f-8f5e2f1c9a01",
            "t_type": "EX",
            "amount": "40.00",
            "description": "Milk",
            "date": "2024-03-01",
            "category": null,
            "wallet": "7f1c0e6a-3f7e-4c1b-9a57-0d9f2b7a8e11"
        }"#;
        let transaction: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(transaction.kind(), TransactionKind::Expense);
        assert_eq!(transaction.amount(), Decimal::new(4000, 2));
        assert_eq!(transaction.description(), Some("Milk"));
        assert_eq!(transaction.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_long_kind_names_and_unknown() {
        let income: TransactionKind = serde_json::from_str("\"INCOME\"").unwrap();
        let expense: TransactionKind = serde_json::from_str("\"EX\"").unwrap();
        let other: TransactionKind = serde_json::from_str("\"TRANSFER\"").unwrap();

        assert_eq!(income, TransactionKind::Income);
        assert_eq!(expense, TransactionKind::Expense);
        assert_eq!(other, TransactionKind::Unknown);
        assert!(!other.is_known());
    }

    #[test]
    fn test_kind_serializes_as_code() {
        assert_eq!(serde_json::to_string(&TransactionKind::Income).unwrap(), "\"IN\"");
        assert_eq!(serde_json::to_string(&TransactionKind::Expense).unwrap(), "\"EX\"");
    }

    #[test]
    fn test_unknown_kind_written_back_as_received() {
        let json = r#"{
            "id": "0b0e7c52-6a43-4a8b-8f0f-8f5e2f1c9a01",
            "t_type": "TRANSFER",
            "amount": "5.00",
            "date": "2024-03-01",
            "wallet": "7f1c0e6a-3f7e-4c1b-9a57-0d9f2b7a8e11"
        }"#;
        let transaction: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(transaction.kind(), TransactionKind::Unknown);

        let value = serde_json::to_value(&transaction).unwrap();
        assert_eq!(value["t_type"], "TRANSFER");

        let known = Transaction::new(
            TransactionId::new_random(),
            TransactionKind::Income,
            Decimal::ONE,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            WalletId::new_random(),
        );
        assert_eq!(serde_json::to_value(&known).unwrap()["t_type"], "IN");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Income".parse::<TransactionKind>().unwrap(), TransactionKind::Income);
        assert_eq!("ex".parse::<TransactionKind>().unwrap(), TransactionKind::Expense);
        assert!("transfer".parse::<TransactionKind>().is_err());
    }
}
