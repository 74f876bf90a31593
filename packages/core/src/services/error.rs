//! Service Layer Error Types
//!
//! One error enum per service, with the four error kinds the category
//! protocol distinguishes: validation (bad input, detected before any
//! write), integrity (a structural rule would be violated), not-found, and
//! storage (transport-level failure, propagated unchanged after rollback).

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Category service errors
#[derive(Error, Debug)]
pub enum CategoryServiceError {
    /// Input rejected before any write
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A structural rule would be violated (e.g. removing a category that
    /// still has children)
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Target category absent from the tree
    #[error("Category not found: {id}")]
    NotFound { id: i64 },

    /// Database operation failed; the surrounding transaction was rolled back
    #[error("Database operation failed: {0}")]
    Storage(#[from] DatabaseError),
}

impl CategoryServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Create a not found error
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }
}

impl From<ValidationError> for CategoryServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Article service errors
#[derive(Error, Debug)]
pub enum ArticleServiceError {
    /// Input rejected before any write
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Target article absent
    #[error("Article not found: {id}")]
    NotFound { id: i64 },

    /// Category layer failure (cache reload, existence checks)
    #[error("Category lookup failed: {0}")]
    Category(#[from] CategoryServiceError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Storage(#[from] DatabaseError),
}

impl ArticleServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }
}

impl From<ValidationError> for ArticleServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
