//! Article Data Structures
//!
//! Articles are flat content rows that reference a category by id. The
//! article layer never touches the category linked lists; it participates in
//! category removal only through the pre-removal hook registered by
//! `ArticleService`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::category::{check_length, ValidationError};

/// Maximum length of an article title, in characters.
pub const ARTICLE_TITLE_MAX_LEN: usize = 200;

/// Maximum length of the keyword field, in characters.
pub const ARTICLE_KEYWORD_MAX_LEN: usize = 200;

/// Maximum size of the article body, in bytes.
pub const ARTICLE_CONTENT_MAX_BYTES: usize = 65_535;

/// Editorial status of an article.
///
/// Stored as an integer discriminant; status transitions are caller policy,
/// the engine only persists the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Draft,
    Final,
    Published,
    Retracted,
}

impl ArticleStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            ArticleStatus::Draft => 1,
            ArticleStatus::Final => 2,
            ArticleStatus::Published => 3,
            ArticleStatus::Retracted => 4,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(ArticleStatus::Draft),
            2 => Some(ArticleStatus::Final),
            3 => Some(ArticleStatus::Published),
            4 => Some(ArticleStatus::Retracted),
            _ => None,
        }
    }
}

/// Source format of the article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleFormat {
    Markdown,
    Html,
    Plain,
}

impl ArticleFormat {
    pub fn as_i64(self) -> i64 {
        match self {
            ArticleFormat::Markdown => 1,
            ArticleFormat::Html => 2,
            ArticleFormat::Plain => 6,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(ArticleFormat::Markdown),
            2 => Some(ArticleFormat::Html),
            6 => Some(ArticleFormat::Plain),
            _ => None,
        }
    }
}

/// A persisted article row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub keyword: String,
    pub content: String,
    pub format: ArticleFormat,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Listing projection: everything except the content body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub keyword: String,
    pub format: ArticleFormat,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Page selection for listing queries.
///
/// Both fields are 1-based; `page_size` rows are skipped per preceding page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Paging {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page == 0 {
            return Err(ValidationError::InvalidId {
                field: "page",
                value: 0,
            });
        }
        if self.page_size == 0 {
            return Err(ValidationError::InvalidId {
                field: "page_size",
                value: 0,
            });
        }
        Ok(())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Parameters for creating an article
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleParams {
    pub category_id: i64,
    pub title: String,
    #[serde(default)]
    pub keyword: String,
    pub content: String,
    pub format: ArticleFormat,
    pub status: ArticleStatus,
}

impl CreateArticleParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category_id <= 0 {
            return Err(ValidationError::InvalidId {
                field: "category_id",
                value: self.category_id,
            });
        }
        check_length("title", &self.title, 1, ARTICLE_TITLE_MAX_LEN)?;
        check_length("keyword", &self.keyword, 0, ARTICLE_KEYWORD_MAX_LEN)?;
        if self.content.len() > ARTICLE_CONTENT_MAX_BYTES {
            return Err(ValidationError::ContentTooLarge {
                field: "content",
                max: ARTICLE_CONTENT_MAX_BYTES,
                len: self.content.len(),
            });
        }
        Ok(())
    }
}

/// Sparse update: only the provided fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticleParams {
    pub id: i64,
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub keyword: Option<String>,
    pub content: Option<String>,
    pub format: Option<ArticleFormat>,
    pub status: Option<ArticleStatus>,
}

impl UpdateArticleParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId {
                field: "id",
                value: self.id,
            });
        }
        if let Some(category_id) = self.category_id {
            if category_id <= 0 {
                return Err(ValidationError::InvalidId {
                    field: "category_id",
                    value: category_id,
                });
            }
        }
        if let Some(title) = &self.title {
            check_length("title", title, 1, ARTICLE_TITLE_MAX_LEN)?;
        }
        if let Some(keyword) = &self.keyword {
            check_length("keyword", keyword, 0, ARTICLE_KEYWORD_MAX_LEN)?;
        }
        if let Some(content) = &self.content {
            if content.len() > ARTICLE_CONTENT_MAX_BYTES {
                return Err(ValidationError::ContentTooLarge {
                    field: "content",
                    max: ARTICLE_CONTENT_MAX_BYTES,
                    len: content.len(),
                });
            }
        }
        Ok(())
    }
}

/// Filters and paging for article listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListArticlesParams {
    pub category_id: Option<i64>,
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_discriminant_roundtrip() {
        for status in [
            ArticleStatus::Draft,
            ArticleStatus::Final,
            ArticleStatus::Published,
            ArticleStatus::Retracted,
        ] {
            assert_eq!(ArticleStatus::from_i64(status.as_i64()), Some(status));
        }
        assert_eq!(ArticleStatus::from_i64(0), None);
        assert_eq!(ArticleStatus::from_i64(99), None);
    }

    #[test]
    fn test_format_discriminants_match_storage_values() {
        assert_eq!(ArticleFormat::Markdown.as_i64(), 1);
        assert_eq!(ArticleFormat::Html.as_i64(), 2);
        assert_eq!(ArticleFormat::Plain.as_i64(), 6);
        assert_eq!(ArticleFormat::from_i64(3), None);
    }

    #[test]
    fn test_paging_offset() {
        let paging = Paging {
            page: 3,
            page_size: 25,
        };
        assert_eq!(paging.offset(), 50);
        assert_eq!(paging.limit(), 25);

        assert!(Paging { page: 0, page_size: 10 }.validate().is_err());
        assert!(Paging { page: 1, page_size: 0 }.validate().is_err());
        assert!(Paging::default().validate().is_ok());
    }

    #[test]
    fn test_create_params_content_limit_is_bytes() {
        let mut params = CreateArticleParams {
            category_id: 1,
            title: "t".to_string(),
            keyword: String::new(),
            content: "a".repeat(ARTICLE_CONTENT_MAX_BYTES),
            format: ArticleFormat::Markdown,
            status: ArticleStatus::Draft,
        };
        assert!(params.validate().is_ok());

        params.content.push('b');
        assert!(params.validate().is_err());
    }
}
