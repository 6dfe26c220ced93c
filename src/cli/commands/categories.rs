use anyhow::Result;
use client::CategoriesPage;
use model::CategoryId;
use std::io::Write;
use tracing::{debug, info};

use super::{Workspace, report};

pub async fn list_categories<W: Write>(
    workspace: &mut Workspace,
    collapsed: bool,
    out: &mut W,
) -> Result<()> {
    let mut page = CategoriesPage::new();
    page.load(&mut workspace.ctx).await.map_err(|e| report(e, out))?;

    if let Some(message) = page.empty_message() {
        writeln!(out, "{}", message)?;
        return Ok(());
    }
    if !collapsed {
        page.expand_all();
    }

    for row in page.rows() {
        let marker = match (row.has_children, row.expanded) {
            (false, _) => ' ',
            (true, true) => '-',
            (true, false) => '+',
        };
        write!(out, "{}{} {}  [{}]", "  ".repeat(row.depth), marker, row.title, row.id)?;
        if let Some(description) = &row.description {
            write!(out, "  {}", description)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub async fn add_category<W: Write>(
    workspace: &mut Workspace,
    title: String,
    description: Option<String>,
    parent: Option<CategoryId>,
    out: &mut W,
) -> Result<()> {
    let mut page = CategoriesPage::new();
    page.load(&mut workspace.ctx).await.map_err(|e| report(e, out))?;

    let opened = match parent {
        Some(parent) => page.open_create_child(parent),
        None => page.open_create_root(),
    };
    opened.map_err(|e| report(e, out))?;
    if let Some(open) = page.form().current() {
        debug!(form = %open.mode.title(), "Form opened");
    }

    let draft = page.draft_mut().map_err(|e| report(e, out))?;
    draft.title = title.clone();
    draft.description = description.unwrap_or_default();

    page.save(&mut workspace.ctx).await.map_err(|e| report(e, out))?;
    workspace.persist().await?;

    writeln!(out, "Category \"{}\" created", title.trim())?;
    Ok(())
}

/// Prints the cascade for `id` and, with `confirmed`, carries it out.
pub async fn delete_category<W: Write>(
    workspace: &mut Workspace,
    id: CategoryId,
    confirmed: bool,
    out: &mut W,
) -> Result<()> {
    let mut page = CategoriesPage::new();
    page.load(&mut workspace.ctx).await.map_err(|e| report(e, out))?;

    let plan = page.request_delete(id).map_err(|e| report(e, out))?.clone();
    writeln!(out, "{}", page.confirmation_message().unwrap_or_default())?;
    for category_id in plan.deletion_order() {
        let title = page
            .categories()
            .iter()
            .find(|c| c.id == *category_id)
            .map(|c| c.title.as_str())
            .unwrap_or("?");
        writeln!(out, "  - {}  [{}]", title, category_id)?;
    }

    if !confirmed {
        page.cancel_delete().map_err(|e| report(e, out))?;
        writeln!(out, "Cancelled. Re-run with --yes to delete.")?;
        return Ok(());
    }

    let result = page.confirm_delete(&mut workspace.ctx).await;
    // Part of the cascade may have gone through even when it failed.
    workspace.persist().await?;
    result.map_err(|e| report(e, out))?;

    info!(%id, count = plan.len(), "Category cascade deleted");
    writeln!(out, "Deleted {} categories", plan.len())?;
    Ok(())
}
