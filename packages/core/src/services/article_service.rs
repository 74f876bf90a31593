//! Article Service
//!
//! Flat article storage referencing categories by id. The service registers
//! a pre-removal hook with the category protocol at construction: a category
//! cannot be removed while any article still references it, which gives the
//! reference the strength of a foreign key without coupling the tree engine
//! to this module.

use crate::db::{DatabaseService, DbCreateArticleParams};
use crate::models::{
    Article, ArticleSummary, CreateArticleParams, ListArticlesParams, UpdateArticleParams,
};
use crate::services::category_service::CategoryService;
use crate::services::error::{ArticleServiceError, CategoryServiceError};
use crate::services::remove_hooks::HookId;
use std::sync::Arc;

pub struct ArticleService {
    db: Arc<DatabaseService>,
    categories: Arc<CategoryService>,
    hook_id: HookId,
}

impl ArticleService {
    /// Create the service and register its category pre-removal hook.
    pub fn new(db: Arc<DatabaseService>, categories: Arc<CategoryService>) -> Self {
        let hook_db = db.clone();
        let hook_id = categories.register_remove_hook(move |category_id| {
            let db = hook_db.clone();
            Box::pin(async move {
                let count = db
                    .db_count_articles_in_category(category_id)
                    .await
                    .map_err(CategoryServiceError::from)?;
                if count > 0 {
                    return Err(CategoryServiceError::integrity(format!(
                        "category {} still has {} articles",
                        category_id, count
                    )));
                }
                Ok(())
            })
        });

        Self {
            db,
            categories,
            hook_id,
        }
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), ArticleServiceError> {
        if !self.categories.exists(category_id).await? {
            return Err(ArticleServiceError::validation(format!(
                "unknown category {}",
                category_id
            )));
        }
        Ok(())
    }

    /// Create an article; returns the store-assigned id.
    pub async fn create(&self, params: CreateArticleParams) -> Result<i64, ArticleServiceError> {
        params.validate()?;
        self.ensure_category(params.category_id).await?;

        let id = self
            .db
            .db_insert_article(DbCreateArticleParams {
                category_id: params.category_id,
                title: &params.title,
                keyword: &params.keyword,
                content: &params.content,
                format: params.format.as_i64(),
                status: params.status.as_i64(),
            })
            .await?;

        tracing::debug!(id, category_id = params.category_id, "created article");
        Ok(id)
    }

    /// Sparse update: only the provided fields change.
    pub async fn update(&self, params: UpdateArticleParams) -> Result<(), ArticleServiceError> {
        params.validate()?;

        let current = self
            .db
            .db_get_article(params.id)
            .await?
            .ok_or_else(|| ArticleServiceError::not_found(params.id))?;

        if let Some(category_id) = params.category_id {
            if category_id != current.category_id {
                self.ensure_category(category_id).await?;
            }
        }

        let category_id = params.category_id.unwrap_or(current.category_id);
        let title = params.title.unwrap_or(current.title);
        let keyword = params.keyword.unwrap_or(current.keyword);
        let content = params.content.unwrap_or(current.content);
        let format = params.format.unwrap_or(current.format);
        let status = params.status.unwrap_or(current.status);

        self.db
            .db_update_article(
                params.id,
                DbCreateArticleParams {
                    category_id,
                    title: &title,
                    keyword: &keyword,
                    content: &content,
                    format: format.as_i64(),
                    status: status.as_i64(),
                },
            )
            .await?;

        Ok(())
    }

    /// Retrieve a single article.
    pub async fn retrieve(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        Ok(self.db.db_get_article(id).await?)
    }

    /// Delete an article: the row is copied into the trash table and removed
    /// from `articles` in one transaction.
    pub async fn remove(&self, id: i64) -> Result<(), ArticleServiceError> {
        let article = self
            .db
            .db_get_article(id)
            .await?
            .ok_or_else(|| ArticleServiceError::not_found(id))?;

        let conn = self.db.connect_with_timeout().await?;
        DatabaseService::begin_transaction(&conn).await?;

        let result = async {
            DatabaseService::db_trash_article(&conn, &article).await?;
            DatabaseService::db_delete_article(&conn, id).await?;
            Ok::<(), crate::db::DatabaseError>(())
        }
        .await;

        match result {
            Ok(()) => {
                DatabaseService::commit(&conn).await?;
                tracing::debug!(id, "trashed article");
                Ok(())
            }
            Err(e) => {
                DatabaseService::rollback(&conn).await;
                Err(e.into())
            }
        }
    }

    /// List article summaries, newest first, with optional category and
    /// status filters.
    pub async fn list(
        &self,
        params: ListArticlesParams,
    ) -> Result<Vec<ArticleSummary>, ArticleServiceError> {
        let paging = params.paging.unwrap_or_default();
        paging.validate()?;

        Ok(self
            .db
            .db_list_articles(
                params.category_id,
                params.status.map(|s| s.as_i64()),
                paging.limit(),
                paging.offset(),
            )
            .await?)
    }
}

impl Drop for ArticleService {
    fn drop(&mut self) {
        // The hook captures this service's database handle; dropping the
        // service must stop the category protocol from invoking it.
        self.categories.unregister_remove_hook(self.hook_id);
    }
}
