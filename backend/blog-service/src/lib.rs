/// Blog Service Library
///
/// REST backend for a blog: posts with tags, likes and an optional image,
/// and comments attached to posts.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Posts, comments, image metadata, search and pagination
/// - `services`: Business logic and image file storage
/// - `db`: Repository traits and their PostgreSQL implementations
/// - `middleware`: Request metrics middleware
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::web;
use std::sync::Arc;

use config::StorageConfig;
use db::{CommentRepository, ImageRepository, PostRepository};
use services::{
    CommentService, FileNameGenerator, FileStorageService, ImageService, ImageValidator,
    PathResolver, PostService,
};

/// Build file storage from its configuration section.
pub fn build_storage(config: &StorageConfig) -> FileStorageService {
    FileStorageService::new(
        PathResolver::new(&config.upload_dir),
        FileNameGenerator::new(&config.default_extension),
    )
}

/// Services shared by every worker, wired from repository implementations.
#[derive(Clone)]
pub struct AppServices {
    pub posts: web::Data<PostService>,
    pub comments: web::Data<CommentService>,
    pub images: web::Data<ImageService>,
}

impl AppServices {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        image_repo: Arc<dyn ImageRepository>,
        storage: Arc<FileStorageService>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            posts: web::Data::new(PostService::new(post_repo.clone(), storage.clone())),
            comments: web::Data::new(CommentService::new(comment_repo, post_repo)),
            images: web::Data::new(ImageService::new(
                image_repo,
                storage,
                ImageValidator::new(config.max_upload_bytes),
                config.image_url_prefix.clone(),
            )),
        }
    }

    /// Register the services and the `/api/posts` routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.posts.clone())
            .app_data(self.comments.clone())
            .app_data(self.images.clone());
        handlers::configure(cfg);
    }
}
