//! Business Services
//!
//! - [`category_service`] - the structural mutation protocol over the
//!   category forest
//! - [`category_tree`] - the cached, lazily rebuilt tree view
//! - [`remove_hooks`] - pre-removal hook registry
//! - [`article_service`] - article storage participating in category
//!   removal through a registered hook
//! - [`error`] - service-layer error types

pub mod article_service;
pub mod category_service;
pub mod category_tree;
pub mod error;
pub mod remove_hooks;

pub use article_service::ArticleService;
pub use category_service::CategoryService;
pub use category_tree::{CategoryTreeCache, TreeSnapshot};
pub use error::{ArticleServiceError, CategoryServiceError};
pub use remove_hooks::{HookFuture, HookId, RemoveHook, RemoveHookRegistry};
