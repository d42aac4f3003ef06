use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{ImageMetadata, PostImageRecord};

/// Image metadata columns on `post`. The bytes are handled by file storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// `None` when the post does not exist; the record's metadata is `None`
    /// when the post has no image.
    async fn find_image(&self, post_id: i64) -> Result<Option<PostImageRecord>>;

    /// Returns `false` when the post does not exist.
    async fn update_image(&self, post_id: i64, image: &ImageMetadata) -> Result<bool>;
}

/// PostgreSQL implementation of [`ImageRepository`].
#[derive(Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn find_image(&self, post_id: i64) -> Result<Option<PostImageRecord>> {
        let record = sqlx::query_as::<_, PostImageRecord>(
            r#"
            SELECT id AS post_id, image_filename, image_original_name, image_size, image_url
            FROM post
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_image(&self, post_id: i64, image: &ImageMetadata) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE post
            SET image_filename = $1,
                image_original_name = $2,
                image_size = $3,
                image_url = $4,
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&image.filename)
        .bind(&image.original_name)
        .bind(image.size)
        .bind(&image.url)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
