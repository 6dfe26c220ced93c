use model::{Transaction, TransactionKind};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// Totals of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// `total_income - total_expense`
    pub balance: Decimal,
    /// Number of transactions given, counted or not.
    pub transaction_count: usize,
}

/// Sums income and expense over whatever collection it is given.
///
/// The collection is taken as already filtered by the store. Transactions of an
/// unknown kind contribute to neither sum.
#[instrument(skip(transactions), fields(count = transactions.len()))]
pub fn aggregate(transactions: &[Transaction]) -> LedgerSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut skipped = 0usize;

    for transaction in transactions {
        match transaction.kind() {
            TransactionKind::Income => total_income += transaction.amount(),
            TransactionKind::Expense => total_expense += transaction.amount(),
            TransactionKind::Unknown => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "Transactions of unknown kind excluded from totals");
    }

    LedgerSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        transaction_count: transactions.len(),
    }
}
