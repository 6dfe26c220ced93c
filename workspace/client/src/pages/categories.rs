use common::CategoryDraft;
use compute::{CascadePlan, CategoryNode, TreeRow, build_forest, plan_cascade, root_categories, visible_rows};
use model::{Category, CategoryId};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

use crate::context::AppContext;
use crate::error::{ClientError, Result, StoreError};
use crate::form::{Form, PendingDeletion};
use crate::load::LoadState;
use crate::store::{RecordStore, ResourceKind};

pub const EMPTY_MESSAGE: &str = "No categories yet. Add the first category.";

/// What the category form is editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFormMode {
    CreateRoot,
    /// New category under a fixed parent; the parent selector is hidden.
    CreateChild {
        parent: CategoryId,
        parent_title: String,
    },
    Edit {
        id: CategoryId,
    },
}

impl CategoryFormMode {
    pub fn title(&self) -> String {
        match self {
            CategoryFormMode::CreateRoot => "New category".to_string(),
            CategoryFormMode::CreateChild { parent_title, .. } => {
                format!("New subcategory for \"{}\"", parent_title)
            }
            CategoryFormMode::Edit { .. } => "Edit category".to_string(),
        }
    }

    pub fn shows_parent_selector(&self) -> bool {
        !matches!(self, CategoryFormMode::CreateChild { .. })
    }

    fn editing(&self) -> Option<CategoryId> {
        match self {
            CategoryFormMode::Edit { id } => Some(*id),
            _ => None,
        }
    }
}

/// Entry of the parent selector. `id` is `None` for "Root category".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOption {
    pub id: Option<CategoryId>,
    pub label: String,
}

/// Categories page: the category tree with its create, edit and delete workflows.
#[derive(Debug, Default)]
pub struct CategoriesPage {
    categories: Vec<Category>,
    forest: Vec<CategoryNode>,
    load_state: LoadState,
    expanded: HashSet<CategoryId>,
    form: Form<CategoryDraft, CategoryFormMode>,
    deletion: Option<PendingDeletion<CascadePlan>>,
}

impl CategoriesPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn forest(&self) -> &[CategoryNode] {
        &self.forest
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Page-level error banner.
    pub fn banner(&self) -> Option<&str> {
        self.load_state.error()
    }

    /// Message shown instead of the tree once an empty collection has loaded.
    pub fn empty_message(&self) -> Option<&'static str> {
        (self.load_state.is_loaded() && self.categories.is_empty()).then_some(EMPTY_MESSAGE)
    }

    pub fn form(&self) -> &Form<CategoryDraft, CategoryFormMode> {
        &self.form
    }

    pub fn pending_deletion(&self) -> Option<&PendingDeletion<CascadePlan>> {
        self.deletion.as_ref()
    }

    // ===================== Tree view =====================

    pub fn rows(&self) -> Vec<TreeRow> {
        visible_rows(&self.forest, &self.expanded)
    }

    pub fn is_expanded(&self, id: CategoryId) -> bool {
        self.expanded.contains(&id)
    }

    /// Flips the expansion of `id` and returns the new state.
    pub fn toggle_expanded(&mut self, id: CategoryId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.categories.iter().map(|c| c.id).collect();
    }

    // ===================== Loading =====================

    /// Replaces the collection with the store's current categories.
    #[instrument(skip_all)]
    pub async fn load<S: RecordStore>(&mut self, ctx: &mut AppContext<S>) -> Result<()> {
        let token = match ctx.token() {
            Ok(token) => token,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        self.load_state = LoadState::Loading;

        match ctx.store.list_categories(&token).await {
            Ok(categories) => {
                info!(count = categories.len(), "Categories loaded");
                self.replace(categories);
                self.load_state = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                if ctx.absorb_auth_failure(&err) {
                    self.reset();
                    return Err(ClientError::SessionExpired);
                }
                error!(error = %err, "Failed to load categories");
                self.load_state = LoadState::Failed(err.to_string());
                Err(ClientError::Load {
                    kind: ResourceKind::Category,
                    message: err.to_string(),
                })
            }
        }
    }

    fn replace(&mut self, categories: Vec<Category>) {
        self.forest = build_forest(&categories);
        self.expanded
            .retain(|id| categories.iter().any(|c| c.id == *id));
        self.categories = categories;
    }

    /// Drops everything after the session ended.
    fn reset(&mut self) {
        debug!("Resetting categories page");
        *self = Self::default();
    }

    fn find(&self, id: CategoryId) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .ok_or(ClientError::UnknownCategory(id))
    }

    // ===================== Form =====================

    pub fn open_create_root(&mut self) -> Result<()> {
        self.form
            .open(CategoryFormMode::CreateRoot, CategoryDraft::default())
    }

    /// Opens the form for a new child of `parent`, with the parent fixed.
    pub fn open_create_child(&mut self, parent: CategoryId) -> Result<()> {
        let parent_title = self.find(parent)?.title.clone();
        self.form.open(
            CategoryFormMode::CreateChild {
                parent,
                parent_title,
            },
            CategoryDraft::child_of(parent),
        )
    }

    pub fn open_edit(&mut self, id: CategoryId) -> Result<()> {
        let draft = CategoryDraft::from_category(self.find(id)?);
        self.form.open(CategoryFormMode::Edit { id }, draft)
    }

    pub fn draft_mut(&mut self) -> Result<&mut CategoryDraft> {
        self.form.draft_mut()
    }

    pub fn cancel_form(&mut self) -> Result<()> {
        self.form.close()
    }

    /// Options of the parent selector for the open form.
    ///
    /// Empty when no form is open or the parent is fixed.
    pub fn parent_options(&self) -> Vec<ParentOption> {
        let Some(open) = self.form.current() else {
            return Vec::new();
        };
        if !open.mode.shows_parent_selector() {
            return Vec::new();
        }
        let editing = open.mode.editing();

        let mut options = vec![ParentOption {
            id: None,
            label: "Root category".to_string(),
        }];
        options.extend(
            root_categories(&self.categories)
                .into_iter()
                .filter(|c| Some(c.id) != editing)
                .map(|c| ParentOption {
                    id: Some(c.id),
                    label: c.title.clone(),
                }),
        );
        options
    }

    /// Validates and submits the open form, then reloads the collection.
    ///
    /// A validation failure sends nothing. A store failure keeps the form editing
    /// with its input and shows the error.
    #[instrument(skip_all)]
    pub async fn save<S: RecordStore>(&mut self, ctx: &mut AppContext<S>) -> Result<()> {
        let open = self.form.editing()?;
        let mode = open.mode.clone();
        let mut draft = open.draft.clone();
        if let CategoryFormMode::CreateChild { parent, .. } = &mode {
            draft.parent = Some(*parent);
        }

        let payload = match draft.validate(mode.editing()) {
            Ok(payload) => payload,
            Err(errors) => {
                self.form.reject(errors.clone());
                return Err(ClientError::Validation(errors));
            }
        };
        let token = match ctx.token() {
            Ok(token) => token,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };

        self.form.begin_save()?;
        let result = match mode {
            CategoryFormMode::Edit { id } => {
                debug!(%id, "Updating category");
                ctx.store.update_category(&token, id, &payload).await
            }
            _ => {
                debug!(title = %payload.title, "Creating category");
                ctx.store.create_category(&token, &payload).await
            }
        };

        match result {
            Ok(category) => {
                info!(id = %category.id, title = %category.title, "Category saved");
                self.form.finish();
                if let Some(parent) = category.parent {
                    self.expanded.insert(parent);
                }
                self.load(ctx).await
            }
            Err(err) => Err(self.save_failed(ctx, err)),
        }
    }

    fn save_failed<S: RecordStore>(&mut self, ctx: &mut AppContext<S>, err: StoreError) -> ClientError {
        if ctx.absorb_auth_failure(&err) {
            self.reset();
            return ClientError::SessionExpired;
        }
        warn!(error = %err, "Failed to save category");
        self.form.fail(err.to_string());
        ClientError::Mutation {
            kind: ResourceKind::Category,
            message: err.to_string(),
        }
    }

    // ===================== Deletion =====================

    /// Plans the deletion of `id` and its descendants and waits for confirmation.
    pub fn request_delete(&mut self, id: CategoryId) -> Result<&CascadePlan> {
        if self.deletion.as_ref().is_some_and(|d| d.is_deleting()) {
            return Err(ClientError::Busy);
        }
        let plan = plan_cascade(&self.forest, id)?;
        let pending = self.deletion.insert(PendingDeletion::new(plan));
        Ok(pending.subject())
    }

    /// Question put to the user before the cascade is issued.
    pub fn confirmation_message(&self) -> Option<String> {
        let plan = self.deletion.as_ref()?.subject();
        let descendants = plan.descendants().len();
        Some(if descendants == 0 {
            format!("Delete category \"{}\"?", plan.target_title)
        } else {
            format!(
                "Delete category \"{}\"? Its {} subcategories will be deleted too.",
                plan.target_title, descendants
            )
        })
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        match &self.deletion {
            None => Err(ClientError::NoPendingDeletion),
            Some(pending) if pending.is_deleting() => Err(ClientError::Busy),
            Some(_) => {
                self.deletion = None;
                Ok(())
            }
        }
    }

    /// Issues the confirmed cascade, children before parents, then reloads.
    ///
    /// The first failing request stops the cascade. Whatever was already deleted
    /// stays deleted; the collection is reloaded and the remaining plan is offered
    /// again with the error.
    #[instrument(skip_all)]
    pub async fn confirm_delete<S: RecordStore>(&mut self, ctx: &mut AppContext<S>) -> Result<()> {
        if self.deletion.is_none() {
            return Err(ClientError::NoPendingDeletion);
        }
        let token = match ctx.token() {
            Ok(token) => token,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        let pending = self.deletion.as_mut().ok_or(ClientError::NoPendingDeletion)?;
        pending.begin()?;
        let target = pending.subject().target;
        let order = pending.subject().deletion_order().to_vec();
        info!(%target, count = order.len(), "Deleting category cascade");

        let mut deleted = 0usize;
        let mut failure = None;
        for id in order {
            match ctx.store.delete_category(&token, id).await {
                Ok(()) => deleted += 1,
                Err(err) => {
                    failure = Some((id, err));
                    break;
                }
            }
        }

        let Some((failed_id, err)) = failure else {
            self.deletion = None;
            return self.load(ctx).await;
        };
        if ctx.absorb_auth_failure(&err) {
            self.reset();
            return Err(ClientError::SessionExpired);
        }
        error!(id = %failed_id, deleted, error = %err, "Category cascade stopped");

        if deleted > 0 {
            if let Err(reload) = self.load(ctx).await {
                warn!(error = %reload, "Reload after partial cascade failed");
            }
        }
        self.deletion = plan_cascade(&self.forest, target)
            .ok()
            .map(|plan| PendingDeletion::new(plan).with_error(err.to_string()));

        Err(ClientError::Mutation {
            kind: ResourceKind::Category,
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{DeletionPhase, FormPhase};
    use crate::store::{MemoryStore, StoreAction, StoreCall, StoreSnapshot};
    use crate::test_utils::{category, context_with, date, init_test_tracing, wallet};
    use common::{FormField, TransactionPayload};
    use model::TransactionKind;
    use rust_decimal::Decimal;

    const LIST: StoreCall = StoreCall {
        kind: ResourceKind::Category,
        action: StoreAction::List,
    };
    const CREATE: StoreCall = StoreCall {
        kind: ResourceKind::Category,
        action: StoreAction::Create,
    };
    const DELETE: StoreCall = StoreCall {
        kind: ResourceKind::Category,
        action: StoreAction::Delete,
    };

    /// Food > Groceries, plus the unrelated Bills.
    async fn loaded_page() -> (CategoriesPage, AppContext<MemoryStore>, [Category; 3]) {
        let food = category("Food");
        let groceries = category("Groceries").with_parent(food.id);
        let bills = category("Bills");
        let mut ctx = context_with(StoreSnapshot {
            categories: vec![food.clone(), groceries.clone(), bills.clone()],
            ..StoreSnapshot::default()
        });
        let mut page = CategoriesPage::new();
        page.load(&mut ctx).await.unwrap();
        (page, ctx, [food, groceries, bills])
    }

    #[tokio::test]
    async fn test_load_builds_forest() {
        let _guard = init_test_tracing();
        let (page, _ctx, [food, groceries, bills]) = loaded_page().await;

        let roots: Vec<CategoryId> = page.forest().iter().map(|n| n.id()).collect();
        assert_eq!(roots, vec![bills.id, food.id]);
        assert_eq!(page.forest()[1].children[0].id(), groceries.id);
        assert!(page.load_state().is_loaded());
        assert_eq!(page.empty_message(), None);
    }

    #[tokio::test]
    async fn test_empty_collection_shows_message() {
        let mut ctx = context_with(StoreSnapshot::default());
        let mut page = CategoriesPage::new();
        assert_eq!(page.empty_message(), None);

        page.load(&mut ctx).await.unwrap();

        assert_eq!(page.empty_message(), Some(EMPTY_MESSAGE));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_last_known_collection() {
        let (mut page, mut ctx, _) = loaded_page().await;
        ctx.store
            .fail_next(LIST, StoreError::Transport("connection reset".to_string()))
            .await;

        let result = page.load(&mut ctx).await;

        assert!(matches!(result, Err(ClientError::Load { .. })));
        assert_eq!(page.banner(), Some("Request failed: connection reset"));
        assert_eq!(page.categories().len(), 3);
    }

    #[tokio::test]
    async fn test_create_root_then_reload() {
        let _guard = init_test_tracing();
        let (mut page, mut ctx, _) = loaded_page().await;
        ctx.store.clear_calls().await;

        page.open_create_root().unwrap();
        page.draft_mut().unwrap().title = "  Transport ".to_string();
        page.save(&mut ctx).await.unwrap();

        assert_eq!(ctx.store.calls().await, vec![CREATE, LIST]);
        assert_eq!(page.form().phase(), FormPhase::Idle);
        assert!(page.categories().iter().any(|c| c.title == "Transport"));
    }

    #[tokio::test]
    async fn test_child_form_has_fixed_parent() {
        let (mut page, mut ctx, [food, _, bills]) = loaded_page().await;

        page.open_create_child(food.id).unwrap();
        let open = page.form().current().unwrap();
        assert_eq!(open.mode.title(), "New subcategory for \"Food\"");
        assert_eq!(open.draft.parent, Some(food.id));
        assert!(page.parent_options().is_empty());

        // Tampering with the parent does not move the new category.
        let draft = page.draft_mut().unwrap();
        draft.title = "Restaurants".to_string();
        draft.parent = Some(bills.id);
        page.save(&mut ctx).await.unwrap();

        let created = page
            .categories()
            .iter()
            .find(|c| c.title == "Restaurants")
            .unwrap();
        assert_eq!(created.parent, Some(food.id));
        assert!(page.is_expanded(food.id));
    }

    #[tokio::test]
    async fn test_parent_selector_excludes_edited_category() {
        let (mut page, _ctx, [food, _, bills]) = loaded_page().await;

        page.open_edit(food.id).unwrap();
        let options = page.parent_options();

        assert_eq!(page.form().current().unwrap().mode.title(), "Edit category");
        assert_eq!(
            options,
            vec![
                ParentOption {
                    id: None,
                    label: "Root category".to_string()
                },
                ParentOption {
                    id: Some(bills.id),
                    label: "Bills".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let (mut page, mut ctx, _) = loaded_page().await;
        ctx.store.clear_calls().await;

        page.open_create_root().unwrap();
        let result = page.save(&mut ctx).await;

        match result {
            Err(ClientError::Validation(errors)) => assert!(errors.contains(FormField::Title)),
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(ctx.store.calls().await.is_empty());
        assert_eq!(page.form().phase(), FormPhase::Editing);
        assert!(page.form().current().unwrap().field_errors.contains(FormField::Title));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_input_and_collection() {
        let (mut page, mut ctx, _) = loaded_page().await;
        let before = page.categories().to_vec();
        ctx.store
            .fail_next(CREATE, StoreError::Rejected("Server error".to_string()))
            .await;

        page.open_create_root().unwrap();
        page.draft_mut().unwrap().title = "Health".to_string();
        page.draft_mut().unwrap().description = "Doctors".to_string();
        let result = page.save(&mut ctx).await;

        assert!(matches!(result, Err(ClientError::Mutation { .. })));
        assert_eq!(page.form().phase(), FormPhase::Editing);
        let open = page.form().current().unwrap();
        assert_eq!(open.draft.title, "Health");
        assert_eq!(open.draft.description, "Doctors");
        assert_eq!(open.error.as_deref(), Some("Server error"));
        assert_eq!(page.categories(), before.as_slice());
        assert_eq!(ctx.store.snapshot().await.categories.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (mut page, mut ctx, [food, groceries, _]) = loaded_page().await;
        ctx.store.clear_calls().await;

        let plan = page.request_delete(food.id).unwrap();
        assert_eq!(plan.deletion_order(), &[groceries.id, food.id]);
        assert_eq!(
            page.confirmation_message().unwrap(),
            "Delete category \"Food\"? Its 1 subcategories will be deleted too."
        );
        assert!(ctx.store.calls().await.is_empty());

        page.cancel_delete().unwrap();
        assert!(page.pending_deletion().is_none());
        assert_eq!(page.confirm_delete(&mut ctx).await, Err(ClientError::NoPendingDeletion));
        assert!(ctx.store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_cascade_deletes_descendants_only() {
        let _guard = init_test_tracing();
        let (mut page, mut ctx, [food, _, bills]) = loaded_page().await;
        ctx.store.clear_calls().await;

        page.request_delete(food.id).unwrap();
        page.confirm_delete(&mut ctx).await.unwrap();

        assert_eq!(ctx.store.calls().await, vec![DELETE, DELETE, LIST]);
        let remaining: Vec<CategoryId> = page.categories().iter().map(|c| c.id).collect();
        assert_eq!(remaining, vec![bills.id]);
        assert!(page.pending_deletion().is_none());
    }

    #[tokio::test]
    async fn test_partial_cascade_failure_reloads_and_reoffers() {
        let cash = wallet("Cash");
        let home = category("Home");
        let rent = category("Rent").with_parent(home.id);
        let mut ctx = context_with(StoreSnapshot {
            wallets: vec![cash.clone()],
            categories: vec![home.clone(), rent.clone()],
            transactions: vec![],
        });
        // A transaction still filed under Home makes the store refuse it.
        ctx.store
            .create_transaction(
                &ctx.session.token().unwrap().clone(),
                &TransactionPayload {
                    kind: TransactionKind::Expense,
                    amount: Decimal::from(500),
                    description: None,
                    date: date(2024, 3, 1),
                    category: Some(home.id),
                    wallet: cash.id,
                },
            )
            .await
            .unwrap();
        let mut page = CategoriesPage::new();
        page.load(&mut ctx).await.unwrap();
        ctx.store.clear_calls().await;

        page.request_delete(home.id).unwrap();
        let result = page.confirm_delete(&mut ctx).await;

        assert!(matches!(result, Err(ClientError::Mutation { .. })));
        assert_eq!(ctx.store.calls().await, vec![DELETE, DELETE, LIST]);
        let remaining: Vec<CategoryId> = page.categories().iter().map(|c| c.id).collect();
        assert_eq!(remaining, vec![home.id]);
        let pending = page.pending_deletion().unwrap();
        assert_eq!(pending.phase(), DeletionPhase::AwaitingConfirmation);
        assert_eq!(pending.subject().deletion_order(), &[home.id]);
        assert_eq!(pending.error(), Some("Category is used by 1 transaction(s)"));
    }

    #[tokio::test]
    async fn test_failed_first_delete_can_be_retried() {
        let (mut page, mut ctx, [food, groceries, _]) = loaded_page().await;
        ctx.store
            .fail_next(DELETE, StoreError::Transport("timeout".to_string()))
            .await;

        page.request_delete(groceries.id).unwrap();
        assert!(page.confirm_delete(&mut ctx).await.is_err());
        assert_eq!(page.categories().len(), 3);
        assert_eq!(page.pending_deletion().unwrap().error(), Some("Request failed: timeout"));

        page.confirm_delete(&mut ctx).await.unwrap();
        assert!(!page.categories().iter().any(|c| c.id == groceries.id));
        assert!(page.categories().iter().any(|c| c.id == food.id));
    }

    #[tokio::test]
    async fn test_unauthorized_invalidates_session_and_resets() {
        let (mut page, mut ctx, [food, _, _]) = loaded_page().await;
        page.toggle_expanded(food.id);
        ctx.store.fail_next(CREATE, StoreError::Unauthorized).await;

        page.open_create_root().unwrap();
        page.draft_mut().unwrap().title = "Travel".to_string();
        let result = page.save(&mut ctx).await;

        assert_eq!(result, Err(ClientError::SessionExpired));
        assert!(!ctx.session.is_valid());
        assert!(page.categories().is_empty());
        assert_eq!(page.form().phase(), FormPhase::Idle);
        assert!(!page.is_expanded(food.id));

        // Nothing else reaches the store until a new session exists.
        ctx.store.clear_calls().await;
        assert_eq!(page.load(&mut ctx).await, Err(ClientError::SessionExpired));
        assert!(ctx.store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_expanded_shows_children() {
        let (mut page, _ctx, [food, groceries, _]) = loaded_page().await;
        assert_eq!(page.rows().len(), 2);

        assert!(page.toggle_expanded(food.id));
        let rows = page.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].id, groceries.id);
        assert_eq!(rows[2].depth, 1);

        assert!(!page.toggle_expanded(food.id));
        assert_eq!(page.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_category_actions() {
        let (mut page, _ctx, _) = loaded_page().await;
        let missing = CategoryId::new_random();

        assert_eq!(page.open_edit(missing), Err(ClientError::UnknownCategory(missing)));
        assert_eq!(
            page.request_delete(missing).err(),
            Some(ClientError::UnknownCategory(missing))
        );
    }
}
