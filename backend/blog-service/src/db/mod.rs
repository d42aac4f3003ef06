/// Database access layer
///
/// Repository traits for posts, comments and post images, their PostgreSQL
/// implementations, and the embedded schema migrations.
pub mod comment_repo;
pub mod image_repo;
pub mod post_repo;

pub use comment_repo::{CommentRepository, PgCommentRepository};
pub use image_repo::{ImageRepository, PgImageRepository};
pub use post_repo::{PgPostRepository, PostRepository};

use sqlx::PgPool;
use tracing::info;

/// Apply the migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}
