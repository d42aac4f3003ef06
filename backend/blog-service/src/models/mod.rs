/// Data models for blog-service
///
/// - Post: blog entry with tags, counters and optional image metadata
/// - Comment: text reply owned by exactly one post
/// - ImageMetadata: metadata columns describing the stored image of a post
/// - PostFilter / PageRequest / PostPage: search and pagination
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// A blog post as stored in the `post` table, with its tags aggregated.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub image_filename: Option<String>,
    pub image_original_name: Option<String>,
    pub image_size: Option<i64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn image(&self) -> Option<ImageMetadata> {
        ImageMetadata::from_columns(
            self.image_filename.as_deref(),
            self.image_original_name.as_deref(),
            self.image_size,
            self.image_url.as_deref(),
        )
    }
}

/// Validated input for creating or replacing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    /// Normalized: trimmed, non-empty, unique, sorted.
    pub tags: Vec<String>,
}

/// A comment row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata of the image attached to a post. The bytes live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Generated name of the stored file
    pub filename: String,
    /// File name supplied by the client
    pub original_name: String,
    /// Size in bytes
    pub size: i64,
    /// URL the image is served from
    pub url: String,
}

impl ImageMetadata {
    fn from_columns(
        filename: Option<&str>,
        original_name: Option<&str>,
        size: Option<i64>,
        url: Option<&str>,
    ) -> Option<Self> {
        let filename = filename?;
        Some(Self {
            filename: filename.to_string(),
            original_name: original_name.unwrap_or(filename).to_string(),
            size: size.unwrap_or(0),
            url: url.unwrap_or_default().to_string(),
        })
    }
}

/// Image columns of a single post row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostImageRecord {
    pub post_id: i64,
    pub image_filename: Option<String>,
    pub image_original_name: Option<String>,
    pub image_size: Option<i64>,
    pub image_url: Option<String>,
}

impl PostImageRecord {
    pub fn metadata(&self) -> Option<ImageMetadata> {
        ImageMetadata::from_columns(
            self.image_filename.as_deref(),
            self.image_original_name.as_deref(),
            self.image_size,
            self.image_url.as_deref(),
        )
    }
}

/// Search criteria parsed from the `search` query parameter.
///
/// Words prefixed with `#` are tag filters (all must match); the remaining
/// words, joined by single spaces, are matched case-insensitively against
/// title and text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub text: Option<String>,
    pub tags: Vec<String>,
}

impl PostFilter {
    pub fn parse(search: Option<&str>) -> Self {
        let mut words = Vec::new();
        let mut tags: Vec<String> = Vec::new();

        for word in search.unwrap_or_default().split_whitespace() {
            match word.strip_prefix('#') {
                Some(tag) if !tag.is_empty() => {
                    if !tags.iter().any(|t| t == tag) {
                        tags.push(tag.to_string());
                    }
                }
                Some(_) => {}
                None => words.push(word),
            }
        }

        let text = if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        };

        Self { text, tags }
    }

    /// `ILIKE` pattern for the text part, with wildcards in the input escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.text.as_ref().map(|text| {
            let escaped = text
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }
}

/// A validated page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

impl PageRequest {
    pub const DEFAULT_NUMBER: i64 = 1;
    pub const DEFAULT_SIZE: i64 = 10;

    pub fn new(number: i64, size: i64) -> Result<Self> {
        if number < 1 {
            return Err(AppError::bad_request("pageNumber must be at least 1"));
        }
        if size < 1 {
            return Err(AppError::bad_request("pageSize must be positive"));
        }
        Ok(Self { number, size })
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    /// Rows to skip; saturates so pages far past the end stay empty.
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: Self::DEFAULT_NUMBER,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: PageRequest,
    pub total: i64,
}

impl PostPage {
    /// Number of the last page; an empty result still has one page.
    pub fn last_page(&self) -> i64 {
        if self.total <= 0 {
            return 1;
        }
        (self.total - 1) / self.page.size + 1
    }

    pub fn has_prev(&self) -> bool {
        self.page.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page.number < self.last_page()
    }
}
