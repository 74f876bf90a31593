//! Category Data Structures
//!
//! This module defines the persisted `Category` row, the derived tree view
//! (`CategoryNode`), and the parameter structs for the category mutation
//! operations.
//!
//! # Row encoding
//!
//! A category row encodes its place in the forest with two integer links:
//!
//! - `pid` - the parent category id, `0` for the root group
//! - `next_id` - the next sibling within the same parent group, `0` for the
//!   last sibling
//!
//! The id value `0` is therefore a sentinel and never a real category id
//! (the store assigns ids starting at 1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a category title, in characters.
pub const TITLE_MAX_LEN: usize = 40;

/// Maximum length of a category description, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 200;

/// Field-level validation errors for mutation parameters
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} characters (got {len})")]
    LengthOutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
        len: usize,
    },

    #[error("{field} must not exceed {max} bytes (got {len})")]
    ContentTooLarge {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("{field} must be a positive id (got {value})")]
    InvalidId { field: &'static str, value: i64 },
}

pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::LengthOutOfRange {
            field,
            min,
            max,
            len,
        });
    }
    Ok(())
}

/// A persisted category row.
///
/// Timestamps are managed by the database (`CURRENT_TIMESTAMP` on insert,
/// `modified_at` bumped on every UPDATE).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Parent category id, 0 for the root group
    pub pid: i64,
    /// Next sibling in the same parent group, 0 for the tail
    pub next_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A category with its ordered children, as served by the tree cache.
///
/// The forest is wholly rebuilt from rows on every reload; `children` is
/// owned data, never a view into shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn id(&self) -> i64 {
        self.category.id
    }
}

/// Read-only projection of a category, without children.
///
/// Returned by `CategoryService::retrieve` so callers never hold a reference
/// into the cache's owned tree structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: i64,
    pub pid: i64,
    pub next_id: i64,
    pub title: String,
    pub description: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            pid: category.pid,
            next_id: category.next_id,
            title: category.title.clone(),
            description: category.description.clone(),
        }
    }
}

/// Parameters for creating a category
///
/// `pid` and `next_id` default to 0 (root group, tail position) when omitted.
/// The new category is spliced immediately before `next_id`, or appended at
/// the tail of the group when `next_id` is 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategoryParams {
    pub pid: Option<i64>,
    pub next_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CreateCategoryParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("title", &self.title, 1, TITLE_MAX_LEN)?;
        check_length("description", &self.description, 0, DESCRIPTION_MAX_LEN)?;
        Ok(())
    }
}

/// Parameters for a content-only category update
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategoryParams {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl UpdateCategoryParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId {
                field: "id",
                value: self.id,
            });
        }
        check_length("title", &self.title, 1, TITLE_MAX_LEN)?;
        check_length("description", &self.description, 0, DESCRIPTION_MAX_LEN)?;
        Ok(())
    }
}

/// Parameters for a structural move
///
/// `pid` and `next_id` name the destination: the new parent group and the
/// sibling the category should sit immediately before (0 = tail). Both
/// default to 0, which moves the category to the end of the root group.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveCategoryParams {
    pub id: i64,
    pub pid: Option<i64>,
    pub next_id: Option<i64>,
}

impl MoveCategoryParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId {
                field: "id",
                value: self.id,
            });
        }
        Ok(())
    }
}
