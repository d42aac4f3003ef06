/// Post service - validation, search, CRUD and like counters
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{NewPost, PageRequest, Post, PostFilter, PostPage};
use crate::services::storage::FileStorageService;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_TAG_LENGTH: usize = 64;

/// Trim, drop empty, dedupe. Case is kept; output is sorted.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Validate raw input and build a [`NewPost`] with normalized tags.
pub fn validate_post(title: &str, text: &str, tags: &[String]) -> Result<NewPost> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("Title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::bad_request(format!(
            "Title must not exceed {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    if text.trim().is_empty() {
        return Err(AppError::bad_request("Text must not be empty"));
    }

    let tags = normalize_tags(tags);
    if let Some(tag) = tags.iter().find(|t| t.chars().count() > MAX_TAG_LENGTH) {
        return Err(AppError::bad_request(format!(
            "Tag '{}' exceeds {} characters",
            tag, MAX_TAG_LENGTH
        )));
    }

    Ok(NewPost {
        title: title.to_string(),
        text: text.to_string(),
        tags,
    })
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    storage: Arc<FileStorageService>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, storage: Arc<FileStorageService>) -> Self {
        Self { posts, storage }
    }

    /// Paginated search, newest first. Missing page arguments use the defaults.
    pub async fn search(
        &self,
        search: Option<&str>,
        page_number: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<PostPage> {
        let page = PageRequest::new(
            page_number.unwrap_or(PageRequest::DEFAULT_NUMBER),
            page_size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )?;
        let filter = PostFilter::parse(search);

        let total = self.posts.count(&filter).await?;
        let posts = if total > page.offset() {
            self.posts.search(&filter, page.limit(), page.offset()).await?
        } else {
            Vec::new()
        };

        debug!(
            text = ?filter.text,
            tags = ?filter.tags,
            page = page.number,
            total,
            "posts searched"
        );
        Ok(PostPage { posts, page, total })
    }

    pub async fn get(&self, post_id: i64) -> Result<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))
    }

    pub async fn create(&self, title: &str, text: &str, tags: &[String]) -> Result<Post> {
        let new_post = validate_post(title, text, tags)?;
        let post = self.posts.create(&new_post).await?;

        info!(post_id = post.id, "post created");
        Ok(post)
    }

    /// `body_id` is the id carried in the request body, if any; it must match.
    pub async fn update(
        &self,
        post_id: i64,
        body_id: Option<i64>,
        title: &str,
        text: &str,
        tags: &[String],
    ) -> Result<Post> {
        if let Some(body_id) = body_id {
            if body_id != post_id {
                return Err(AppError::bad_request(format!(
                    "Post id {} in body does not match path id {}",
                    body_id, post_id
                )));
            }
        }

        let new_post = validate_post(title, text, tags)?;
        let post = self
            .posts
            .update(post_id, &new_post)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))?;

        info!(post_id, "post updated");
        Ok(post)
    }

    /// Delete the post and, best effort, its stored image file.
    pub async fn delete(&self, post_id: i64) -> Result<()> {
        let post = self.get(post_id).await?;

        if !self.posts.delete(post_id).await? {
            return Err(AppError::post_not_found(post_id));
        }

        if let Some(filename) = post.image_filename.as_deref() {
            self.storage.delete(filename).await;
        }

        info!(post_id, "post deleted");
        Ok(())
    }

    pub async fn like(&self, post_id: i64) -> Result<i32> {
        self.posts
            .increment_likes(post_id)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))
    }

    pub async fn unlike(&self, post_id: i64) -> Result<i32> {
        self.posts
            .decrement_likes(post_id)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))
    }

    pub async fn find_tags(&self, post_id: i64) -> Result<Vec<String>> {
        if !self.posts.exists(post_id).await? {
            return Err(AppError::post_not_found(post_id));
        }
        self.posts.find_tags(post_id).await
    }

    pub async fn exists(&self, post_id: i64) -> Result<bool> {
        self.posts.exists(post_id).await
    }
}
