/// Comment service - comments scoped by post, keeping the post's comment counter in step
use std::sync::Arc;
use tracing::info;

use crate::db::{CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::models::Comment;

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AppError::bad_request("Comment text must not be empty"));
    }
    Ok(())
}

/// Ids carried in a request body must agree with the path.
fn check_body_ids(
    post_id: i64,
    comment_id: Option<i64>,
    body_post_id: Option<i64>,
    body_comment_id: Option<i64>,
) -> Result<()> {
    if let Some(body_post_id) = body_post_id {
        if body_post_id != post_id {
            return Err(AppError::bad_request(format!(
                "Post id {} in body does not match path id {}",
                body_post_id, post_id
            )));
        }
    }
    if let (Some(body_comment_id), Some(comment_id)) = (body_comment_id, comment_id) {
        if body_comment_id != comment_id {
            return Err(AppError::bad_request(format!(
                "Comment id {} in body does not match path id {}",
                body_comment_id, comment_id
            )));
        }
    }
    Ok(())
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<()> {
        if !self.posts.exists(post_id).await? {
            return Err(AppError::post_not_found(post_id));
        }
        Ok(())
    }

    /// Comments of a post, oldest first.
    pub async fn list(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.ensure_post_exists(post_id).await?;
        self.comments.find_by_post(post_id).await
    }

    pub async fn get(&self, post_id: i64, comment_id: i64) -> Result<Comment> {
        self.comments
            .find(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::comment_not_found(post_id, comment_id))
    }

    pub async fn create(
        &self,
        post_id: i64,
        body_post_id: Option<i64>,
        text: &str,
    ) -> Result<Comment> {
        check_body_ids(post_id, None, body_post_id, None)?;
        validate_text(text)?;
        self.ensure_post_exists(post_id).await?;

        let comment = self.comments.create(post_id, text).await?;

        info!(post_id, comment_id = comment.id, "comment created");
        Ok(comment)
    }

    pub async fn update(
        &self,
        post_id: i64,
        comment_id: i64,
        body_post_id: Option<i64>,
        body_comment_id: Option<i64>,
        text: &str,
    ) -> Result<Comment> {
        check_body_ids(post_id, Some(comment_id), body_post_id, body_comment_id)?;
        validate_text(text)?;

        self.comments
            .update(post_id, comment_id, text)
            .await?
            .ok_or_else(|| AppError::comment_not_found(post_id, comment_id))
    }

    /// The post counter moves with the row inside the repository, so a
    /// missing comment leaves it untouched.
    pub async fn delete(&self, post_id: i64, comment_id: i64) -> Result<()> {
        if !self.comments.delete(post_id, comment_id).await? {
            return Err(AppError::comment_not_found(post_id, comment_id));
        }

        info!(post_id, comment_id, "comment deleted");
        Ok(())
    }
}
