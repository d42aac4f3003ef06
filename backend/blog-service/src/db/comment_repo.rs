use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::Comment;

/// Persistence operations on comments. Every lookup is scoped by post.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments of a post, oldest first.
    async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn find(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>>;

    /// Inserts the comment and bumps the post's comment counter in one transaction.
    async fn create(&self, post_id: i64, text: &str) -> Result<Comment>;

    async fn update(&self, post_id: i64, comment_id: i64, text: &str) -> Result<Option<Comment>>;

    /// Returns `true` only when a row was actually removed; the post's
    /// comment counter is decremented in the same transaction.
    async fn delete(&self, post_id: i64, comment_id: i64) -> Result<bool>;
}

/// PostgreSQL implementation of [`CommentRepository`].
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, text, created_at, updated_at
            FROM comment
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn find(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, text, created_at, updated_at
            FROM comment
            WHERE post_id = $1 AND id = $2
            "#,
        )
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create(&self, post_id: i64, text: &str) -> Result<Comment> {
        let mut tx = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (post_id, text, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, post_id, text, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(text)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            // The post was removed between the existence check and the insert
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::post_not_found(post_id)
            }
            _ => AppError::from(err),
        })?;

        sqlx::query("UPDATE post SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(comment)
    }

    async fn update(&self, post_id: i64, comment_id: i64, text: &str) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comment
            SET text = $1, updated_at = NOW()
            WHERE post_id = $2 AND id = $3
            RETURNING id, post_id, text, created_at, updated_at
            "#,
        )
        .bind(text)
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete(&self, post_id: i64, comment_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM comment WHERE post_id = $1 AND id = $2")
            .bind(post_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE post SET comments_count = GREATEST(comments_count - 1, 0) WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
