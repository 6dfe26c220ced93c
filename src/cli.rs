use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use client::ClientSettings;
use common::TransactionFilter;
use model::{CategoryId, TransactionKind, WalletId};
use std::io::Write;
use std::path::PathBuf;

pub mod commands;

use commands::{
    Workspace, add_category, add_transaction, delete_category, list_categories,
    list_transactions, show_summary,
};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Personal finance tracker: categories, transactions and balances")]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML)
    ///
    /// Defaults to fintrack.toml in the working directory when present.
    #[arg(long, global = true, env = "FINTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session token, overrides the configured one
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Snapshot file holding the records, overrides the configured one
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Transaction kind as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for TransactionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Income => TransactionKind::Income,
            KindArg::Expense => TransactionKind::Expense,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the category tree
    Categories {
        /// Show root categories only
        #[arg(long)]
        collapsed: bool,
    },
    /// List transactions with their totals
    Transactions {
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Only transactions on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Show income, expense and balance
    Summary {
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Only transactions on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Create a category
    AddCategory {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Create the category under this parent
        #[arg(short, long)]
        parent: Option<CategoryId>,
    },
    /// Record a transaction
    AddTransaction {
        #[arg(short, long, value_enum, default_value = "expense")]
        kind: KindArg,

        /// Amount, `.` or `,` as decimal separator
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,

        #[arg(short, long)]
        wallet: WalletId,

        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        category: Option<CategoryId>,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a category together with its subcategories
    ///
    /// Without --yes, only prints what would be deleted.
    DeleteCategory {
        id: CategoryId,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
}

fn filter_of(kind: Option<KindArg>, date: Option<NaiveDate>) -> TransactionFilter {
    TransactionFilter {
        kind: kind.map(Into::into),
        date,
    }
}

impl Cli {
    pub async fn run<W: Write>(self, settings: ClientSettings, out: &mut W) -> Result<()> {
        let mut workspace = Workspace::open(settings)?;
        match self.command {
            Commands::Categories { collapsed } => {
                list_categories(&mut workspace, collapsed, out).await?;
            }
            Commands::Transactions { kind, date } => {
                list_transactions(&mut workspace, filter_of(kind, date), out).await?;
            }
            Commands::Summary { kind, date } => {
                show_summary(&mut workspace, filter_of(kind, date), out).await?;
            }
            Commands::AddCategory {
                title,
                description,
                parent,
            } => {
                add_category(&mut workspace, title, description, parent, out).await?;
            }
            Commands::AddTransaction {
                kind,
                amount,
                wallet,
                date,
                category,
                description,
            } => {
                let draft = commands::TransactionInput {
                    kind: kind.into(),
                    amount,
                    wallet,
                    date,
                    category,
                    description,
                };
                add_transaction(&mut workspace, draft, out).await?;
            }
            Commands::DeleteCategory { id, yes } => {
                delete_category(&mut workspace, id, yes, out).await?;
            }
        }
        Ok(())
    }
}
