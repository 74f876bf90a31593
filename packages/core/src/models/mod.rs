//! Data Structures
//!
//! Core model types for InkSpace:
//!
//! - [`category`] - Category rows, the derived tree view, and mutation parameters
//! - [`article`] - Article rows, status/format enums, and paging

pub mod article;
pub mod category;

pub use article::{
    Article, ArticleFormat, ArticleStatus, ArticleSummary, CreateArticleParams,
    ListArticlesParams, Paging, UpdateArticleParams,
};
pub use category::{
    Category, CategoryNode, CategoryView, CreateCategoryParams, MoveCategoryParams,
    UpdateCategoryParams, ValidationError,
};
