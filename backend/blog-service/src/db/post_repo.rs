use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::Result;
use crate::models::{NewPost, Post, PostFilter};

/// Persistence operations on posts, their tags and counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Posts matching `filter`, newest first.
    async fn search(&self, filter: &PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>>;

    /// Total number of posts matching `filter`.
    async fn count(&self, filter: &PostFilter) -> Result<i64>;

    async fn find_by_id(&self, post_id: i64) -> Result<Option<Post>>;

    async fn exists(&self, post_id: i64) -> Result<bool>;

    /// Insert a post and attach its tags, creating missing tags.
    async fn create(&self, post: &NewPost) -> Result<Post>;

    /// Replace title, text and tags. Counters and image are preserved.
    /// Returns `None` when the post does not exist.
    async fn update(&self, post_id: i64, post: &NewPost) -> Result<Option<Post>>;

    /// Returns `false` when no row was removed.
    async fn delete(&self, post_id: i64) -> Result<bool>;

    /// Counter mutations return the new value, or `None` for a missing post.
    async fn increment_likes(&self, post_id: i64) -> Result<Option<i32>>;

    async fn decrement_likes(&self, post_id: i64) -> Result<Option<i32>>;

    async fn increment_comments(&self, post_id: i64) -> Result<Option<i32>>;

    async fn decrement_comments(&self, post_id: i64) -> Result<Option<i32>>;

    /// Tag names of a post, sorted.
    async fn find_tags(&self, post_id: i64) -> Result<Vec<String>>;
}

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.text,
           ARRAY(
               SELECT t.name FROM tag t
               JOIN post_tag pt ON pt.tag_id = t.id
               WHERE pt.post_id = p.id
               ORDER BY t.name
           ) AS tags,
           p.likes_count, p.comments_count,
           p.image_filename, p.image_original_name, p.image_size, p.image_url,
           p.created_at, p.updated_at
    FROM post p
"#;

// $1: ILIKE pattern or NULL, $2: required tag names (deduplicated)
const SEARCH_CONDITION: &str = r#"
    WHERE ($1::text IS NULL OR p.title ILIKE $1 OR p.text ILIKE $1)
      AND (
          cardinality($2::text[]) = 0
          OR (
              SELECT COUNT(*) FROM post_tag pt
              JOIN tag t ON t.id = pt.tag_id
              WHERE pt.post_id = p.id AND t.name = ANY($2::text[])
          ) = cardinality($2::text[])
      )
"#;

/// PostgreSQL implementation of [`PostRepository`].
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_in_tx(tx: &mut Transaction<'_, Postgres>, post_id: i64) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(post_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(post)
    }

    /// Upsert tags by name and link them to the post.
    async fn attach_tags(
        tx: &mut Transaction<'_, Postgres>,
        post_id: i64,
        tags: &[String],
    ) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO tag (name)
            SELECT UNNEST($1::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(tags)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO post_tag (post_id, tag_id)
            SELECT $1, t.id FROM tag t WHERE t.name = ANY($2::text[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(tags)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn update_counter(&self, sql: &str, post_id: i64) -> Result<Option<i32>> {
        let value = sqlx::query_scalar::<_, i32>(sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn search(&self, filter: &PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let sql = format!("{POST_SELECT} {SEARCH_CONDITION} ORDER BY p.id DESC LIMIT $3 OFFSET $4");
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(filter.like_pattern())
            .bind(&filter.tags)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(found = posts.len(), limit, offset, "post search");
        Ok(posts)
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM post p {SEARCH_CONDITION}");
        let total = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.like_pattern())
            .bind(&filter.tags)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn exists(&self, post_id: i64) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM post WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, post: &NewPost) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let post_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO post (title, text)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .fetch_one(&mut *tx)
        .await?;

        Self::attach_tags(&mut tx, post_id, &post.tags).await?;
        let created = Self::fetch_in_tx(&mut tx, post_id).await?;

        tx.commit().await?;

        debug!(post_id, tags = created.tags.len(), "post created");
        Ok(created)
    }

    async fn update(&self, post_id: i64, post: &NewPost) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE post
            SET title = $1, text = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("DELETE FROM post_tag WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        Self::attach_tags(&mut tx, post_id, &post.tags).await?;
        let updated = Self::fetch_in_tx(&mut tx, post_id).await?;

        tx.commit().await?;

        debug!(post_id, "post updated");
        Ok(Some(updated))
    }

    async fn delete(&self, post_id: i64) -> Result<bool> {
        // comment and post_tag rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM post WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_likes(&self, post_id: i64) -> Result<Option<i32>> {
        self.update_counter(
            "UPDATE post SET likes_count = likes_count + 1 WHERE id = $1 RETURNING likes_count",
            post_id,
        )
        .await
    }

    async fn decrement_likes(&self, post_id: i64) -> Result<Option<i32>> {
        self.update_counter(
            "UPDATE post SET likes_count = GREATEST(likes_count - 1, 0) WHERE id = $1 RETURNING likes_count",
            post_id,
        )
        .await
    }

    async fn increment_comments(&self, post_id: i64) -> Result<Option<i32>> {
        self.update_counter(
            "UPDATE post SET comments_count = comments_count + 1 WHERE id = $1 RETURNING comments_count",
            post_id,
        )
        .await
    }

    async fn decrement_comments(&self, post_id: i64) -> Result<Option<i32>> {
        self.update_counter(
            "UPDATE post SET comments_count = GREATEST(comments_count - 1, 0) WHERE id = $1 RETURNING comments_count",
            post_id,
        )
        .await
    }

    async fn find_tags(&self, post_id: i64) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name
            FROM tag t
            JOIN post_tag pt ON pt.tag_id = t.id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }
}
