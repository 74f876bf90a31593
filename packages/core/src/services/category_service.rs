//! Category Service - the structural mutation protocol
//!
//! All structural edits to the category forest go through this service:
//! `create` splices a new category into a sibling chain, `remove` unlinks a
//! childless one, `move_category` re-splices a subtree across (or within)
//! parent groups, and `update` touches content fields only.
//!
//! Every operation validates against a fresh cache snapshot before any
//! write, runs its statements inside one database transaction, and marks
//! the cache stale on commit. Validation and not-found failures are
//! detected locally and never reach storage; storage failures roll the
//! transaction back and propagate unchanged, with no automatic retry.

use crate::db::{DatabaseError, DatabaseService};
use crate::models::{
    CategoryNode, CategoryView, CreateCategoryParams, MoveCategoryParams, UpdateCategoryParams,
};
use crate::services::category_tree::CategoryTreeCache;
use crate::services::error::CategoryServiceError;
use crate::services::remove_hooks::{HookFuture, HookId, RemoveHookRegistry};
use std::sync::Arc;

/// The category mutation protocol.
///
/// Owns the tree cache and the pre-removal hook registry; composed once per
/// process and shared behind an `Arc`.
pub struct CategoryService {
    db: Arc<DatabaseService>,
    cache: Arc<CategoryTreeCache>,
    remove_hooks: RemoveHookRegistry,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        let cache = Arc::new(CategoryTreeCache::new(db.clone()));
        Self {
            db,
            cache,
            remove_hooks: RemoveHookRegistry::new(),
        }
    }

    /// The shared tree cache (read-side consumers such as the article layer)
    pub fn tree_cache(&self) -> Arc<CategoryTreeCache> {
        self.cache.clone()
    }

    /// Register a pre-removal hook; runs on every `remove` in registration
    /// order and may veto the removal.
    pub fn register_remove_hook<F>(&self, hook: F) -> HookId
    where
        F: Fn(i64) -> HookFuture + Send + Sync + 'static,
    {
        self.remove_hooks.register(hook)
    }

    /// Remove a previously registered pre-removal hook.
    pub fn unregister_remove_hook(&self, id: HookId) -> bool {
        self.remove_hooks.unregister(id)
    }

    /// Create a category.
    ///
    /// `pid` and `next_id` default to 0. The new category is spliced
    /// immediately before `next_id` within group `pid`; with `next_id == 0`
    /// it becomes the group's new tail. Returns the store-assigned id.
    ///
    /// # Errors
    ///
    /// `Validation` when the title/description limits are violated, `pid` or
    /// `next_id` is unknown, or `next_id` is not a sibling under `pid`.
    pub async fn create(&self, params: CreateCategoryParams) -> Result<i64, CategoryServiceError> {
        params.validate()?;
        let pid = params.pid.unwrap_or(0);
        let next_id = params.next_id.unwrap_or(0);

        let snapshot = self.cache.snapshot().await?;

        if pid != 0 && !snapshot.contains(pid) {
            return Err(CategoryServiceError::validation(format!(
                "unknown pid {}",
                pid
            )));
        }
        if next_id != 0 {
            let next = snapshot.get(next_id).ok_or_else(|| {
                CategoryServiceError::validation(format!("unknown next_id {}", next_id))
            })?;
            if next.pid != pid {
                return Err(CategoryServiceError::validation(format!(
                    "next_id {} is not a sibling under pid {}",
                    next_id, pid
                )));
            }
        }

        // The predecessor is read from the snapshot: two concurrent creates
        // into the same group can both see the same predecessor, and only
        // the storage engine's row locking arbitrates the outcome.
        let predecessor = snapshot.predecessor_in_group(pid, next_id).map(|c| c.id);

        let conn = self.db.connect_with_timeout().await?;
        DatabaseService::begin_transaction(&conn).await?;

        let result = async {
            let new_id = DatabaseService::db_insert_category(
                &conn,
                pid,
                next_id,
                &params.title,
                &params.description,
            )
            .await?;
            if let Some(prev_id) = predecessor {
                DatabaseService::db_set_category_next(&conn, prev_id, new_id).await?;
            }
            Ok::<i64, DatabaseError>(new_id)
        }
        .await;

        match result {
            Ok(new_id) => {
                DatabaseService::commit(&conn).await?;
                self.cache.mark_stale();
                tracing::debug!(id = new_id, pid, next_id, "created category");
                Ok(new_id)
            }
            Err(e) => {
                DatabaseService::rollback(&conn).await;
                Err(e.into())
            }
        }
    }

    /// Remove a childless category.
    ///
    /// Registered pre-removal hooks run first and may veto; nothing touches
    /// storage until every hook has passed. The predecessor in the
    /// category's sibling group is repointed to its former `next_id`,
    /// closing the gap.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; `Integrity` when the category still has
    /// children (no writes are performed in either case).
    pub async fn remove(&self, id: i64) -> Result<(), CategoryServiceError> {
        self.remove_hooks.notify(id).await?;

        let snapshot = self.cache.snapshot().await?;
        let category = snapshot
            .get(id)
            .ok_or_else(|| CategoryServiceError::not_found(id))?;

        let children = snapshot.child_count(id);
        if children > 0 {
            return Err(CategoryServiceError::integrity(format!(
                "category {} still has {} child categories",
                id, children
            )));
        }

        let predecessor = snapshot.predecessor_in_group(category.pid, id).map(|c| c.id);
        let former_next = category.next_id;

        let conn = self.db.connect_with_timeout().await?;
        DatabaseService::begin_transaction(&conn).await?;

        let result = async {
            DatabaseService::db_delete_category(&conn, id).await?;
            if let Some(prev_id) = predecessor {
                DatabaseService::db_set_category_next(&conn, prev_id, former_next).await?;
            }
            Ok::<(), DatabaseError>(())
        }
        .await;

        match result {
            Ok(()) => {
                DatabaseService::commit(&conn).await?;
                self.cache.mark_stale();
                tracing::debug!(id, "removed category");
                Ok(())
            }
            Err(e) => {
                DatabaseService::rollback(&conn).await;
                Err(e.into())
            }
        }
    }

    /// Move a category to a new position: under `pid` (0 = root group),
    /// immediately before `next_id` (0 = tail).
    ///
    /// Unlink, relink, and the category's own row update run in one
    /// transaction. The same sequence handles same-parent reordering and
    /// cross-parent moves: the predecessor lookups are scoped by the current
    /// group for the unlink and the destination group for the relink, never
    /// assumed to be shared.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; `Validation` for an unknown or
    /// non-sibling destination, for `next_id == id`, and for a destination
    /// inside the category's own subtree.
    pub async fn move_category(
        &self,
        params: MoveCategoryParams,
    ) -> Result<(), CategoryServiceError> {
        params.validate()?;
        let new_pid = params.pid.unwrap_or(0);
        let new_next_id = params.next_id.unwrap_or(0);

        let snapshot = self.cache.snapshot().await?;
        let category = snapshot
            .get(params.id)
            .ok_or_else(|| CategoryServiceError::not_found(params.id))?;

        if new_next_id == params.id {
            return Err(CategoryServiceError::validation(
                "a category cannot precede itself",
            ));
        }
        if new_pid != 0 && !snapshot.contains(new_pid) {
            return Err(CategoryServiceError::validation(format!(
                "unknown pid {}",
                new_pid
            )));
        }
        if new_next_id != 0 {
            let next = snapshot.get(new_next_id).ok_or_else(|| {
                CategoryServiceError::validation(format!("unknown next_id {}", new_next_id))
            })?;
            if next.pid != new_pid {
                return Err(CategoryServiceError::validation(format!(
                    "next_id {} is not a sibling under pid {}",
                    new_next_id, new_pid
                )));
            }
        }
        if new_pid != 0 && snapshot.has_ancestor_or_self(new_pid, params.id) {
            return Err(CategoryServiceError::validation(format!(
                "cannot move category {} into its own subtree",
                params.id
            )));
        }

        if category.pid == new_pid && category.next_id == new_next_id {
            // Already in place. Writing anyway would make the relink
            // predecessor the category itself and corrupt the chain.
            return Ok(());
        }

        let unlink_predecessor = snapshot
            .predecessor_in_group(category.pid, params.id)
            .map(|c| c.id);
        let relink_predecessor = snapshot
            .predecessor_in_group(new_pid, new_next_id)
            .map(|c| c.id);
        let former_next = category.next_id;

        let conn = self.db.connect_with_timeout().await?;
        DatabaseService::begin_transaction(&conn).await?;

        let result = async {
            if let Some(prev_id) = unlink_predecessor {
                DatabaseService::db_set_category_next(&conn, prev_id, former_next).await?;
            }
            if let Some(prev_id) = relink_predecessor {
                DatabaseService::db_set_category_next(&conn, prev_id, params.id).await?;
            }
            DatabaseService::db_relocate_category(&conn, params.id, new_pid, new_next_id).await?;
            Ok::<(), DatabaseError>(())
        }
        .await;

        match result {
            Ok(()) => {
                DatabaseService::commit(&conn).await?;
                self.cache.mark_stale();
                tracing::debug!(
                    id = params.id,
                    pid = new_pid,
                    next_id = new_next_id,
                    "moved category"
                );
                Ok(())
            }
            Err(e) => {
                DatabaseService::rollback(&conn).await;
                Err(e.into())
            }
        }
    }

    /// Content-only update (title, description). No structural link is
    /// touched, but the cached copy holds the fields, so the cache is still
    /// invalidated.
    pub async fn update(&self, params: UpdateCategoryParams) -> Result<(), CategoryServiceError> {
        params.validate()?;

        let snapshot = self.cache.snapshot().await?;
        if !snapshot.contains(params.id) {
            return Err(CategoryServiceError::not_found(params.id));
        }

        self.db
            .db_update_category_content(params.id, &params.title, &params.description)
            .await?;
        self.cache.mark_stale();
        Ok(())
    }

    /// Read-only projection of one category, without children.
    pub async fn retrieve(&self, id: i64) -> Result<Option<CategoryView>, CategoryServiceError> {
        let snapshot = self.cache.snapshot().await?;
        Ok(snapshot.get(id).map(CategoryView::from))
    }

    /// Whether a category id currently exists.
    pub async fn exists(&self, id: i64) -> Result<bool, CategoryServiceError> {
        Ok(self.cache.snapshot().await?.contains(id))
    }

    /// The whole forest, in sibling order.
    pub async fn tree(&self) -> Result<Vec<CategoryNode>, CategoryServiceError> {
        self.cache.tree().await
    }
}
