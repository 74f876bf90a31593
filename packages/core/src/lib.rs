//! InkSpace Core Category and Article Layer
//!
//! This crate maintains a strictly ordered category hierarchy - a forest of
//! categories, each with ordered children - backed by a flat relational
//! table, plus the article storage that hangs off it.
//!
//! # Architecture
//!
//! - **Flat rows, derived forest**: each category row carries its parent id
//!   (`pid`, 0 = root) and its next sibling (`next_id`, 0 = tail); the tree
//!   view is wholly rebuilt from rows whenever the cache is stale
//! - **Transactional splices**: create/remove/move rewrite the sibling
//!   linked lists inside single database transactions with rollback
//! - **libsql**: embedded SQLite-compatible database
//!
//! # Modules
//!
//! - [`models`] - data structures (Category, CategoryNode, Article, ...)
//! - [`services`] - business services (CategoryService, ArticleService, the
//!   tree cache, and the pre-removal hook registry)
//! - [`db`] - database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::*;
pub use models::*;
pub use services::*;
