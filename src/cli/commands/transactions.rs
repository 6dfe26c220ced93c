use anyhow::Result;
use chrono::{Local, NaiveDate};
use client::TransactionsPage;
use common::TransactionFilter;
use model::{CategoryId, TransactionKind, WalletId};
use std::io::Write;

use super::{Workspace, report};

/// Values of a new transaction as given on the command line.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub kind: TransactionKind,
    pub amount: String,
    pub wallet: WalletId,
    pub date: Option<NaiveDate>,
    pub category: Option<CategoryId>,
    pub description: Option<String>,
}

async fn load_page<W: Write>(
    workspace: &mut Workspace,
    filter: TransactionFilter,
    out: &mut W,
) -> Result<TransactionsPage> {
    let mut page = TransactionsPage::new();
    page.set_filter(&mut workspace.ctx, filter)
        .await
        .map_err(|e| report(e, out))?;
    Ok(page)
}

fn write_summary<W: Write>(page: &TransactionsPage, workspace: &Workspace, out: &mut W) -> Result<()> {
    let summary = page.summary_view(&workspace.ctx.settings);
    writeln!(out, "Income:  {}", summary.income)?;
    writeln!(out, "Expense: {}", summary.expense)?;
    writeln!(out, "Balance: {}", summary.balance)?;
    writeln!(out, "Transactions: {}", summary.count)?;
    Ok(())
}

pub async fn list_transactions<W: Write>(
    workspace: &mut Workspace,
    filter: TransactionFilter,
    out: &mut W,
) -> Result<()> {
    let page = load_page(workspace, filter, out).await?;

    if let Some(message) = page.empty_message() {
        writeln!(out, "{}", message)?;
    }
    for row in page.rows(&workspace.ctx.settings) {
        writeln!(
            out,
            "{}  {:>14}  {}  [{}]  {}",
            row.date,
            row.amount,
            row.category.as_deref().unwrap_or("-"),
            row.wallet.as_deref().unwrap_or("-"),
            row.description
        )?;
    }
    writeln!(out)?;
    write_summary(&page, workspace, out)
}

pub async fn show_summary<W: Write>(
    workspace: &mut Workspace,
    filter: TransactionFilter,
    out: &mut W,
) -> Result<()> {
    let page = load_page(workspace, filter, out).await?;
    write_summary(&page, workspace, out)
}

pub async fn add_transaction<W: Write>(
    workspace: &mut Workspace,
    input: TransactionInput,
    out: &mut W,
) -> Result<()> {
    let mut page = load_page(workspace, TransactionFilter::all(), out).await?;

    page.open_create(Local::now().date_naive())
        .map_err(|e| report(e, out))?;
    let draft = page.draft_mut().map_err(|e| report(e, out))?;
    draft.kind = input.kind;
    draft.amount = input.amount;
    draft.wallet = Some(input.wallet);
    draft.category = input.category;
    draft.description = input.description.unwrap_or_default();
    if let Some(date) = input.date {
        draft.date = Some(date);
    }

    page.save(&mut workspace.ctx).await.map_err(|e| report(e, out))?;
    workspace.persist().await?;

    writeln!(out, "Transaction saved")?;
    write_summary(&page, workspace, out)
}
