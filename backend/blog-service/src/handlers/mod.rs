/// HTTP handlers for blog-service
///
/// - Posts: search, CRUD, likes and tags
/// - Comments: CRUD scoped by post
/// - Images: multipart upload and download of the post image
/// - Health: summary, readiness and liveness probes
pub mod comments;
pub mod health;
pub mod images;
pub mod posts;

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

pub use comments::{create_comment, delete_comment, get_comment, list_comments, update_comment};
pub use images::{download_image, upload_image};
pub use posts::{
    create_post, delete_post, get_post, get_post_tags, like_post, list_posts, unlike_post,
    update_post,
};

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid JSON body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid path parameter: {}", err)).into()
}

/// Register the `/api/posts` routes. Services are expected as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/api/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(list_posts))
                        .route(web::post().to(create_post)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(get_post))
                        .route(web::put().to(update_post))
                        .route(web::delete().to(delete_post)),
                )
                .service(
                    web::resource("/{id}/likes")
                        .route(web::post().to(like_post))
                        .route(web::delete().to(unlike_post)),
                )
                .route("/{id}/tags", web::get().to(get_post_tags))
                .service(
                    web::resource("/{id}/comments")
                        .route(web::get().to(list_comments))
                        .route(web::post().to(create_comment)),
                )
                .service(
                    web::resource("/{id}/comments/{comment_id}")
                        .route(web::get().to(get_comment))
                        .route(web::put().to(update_comment))
                        .route(web::delete().to(delete_comment)),
                )
                .service(
                    web::resource("/{id}/image")
                        .route(web::get().to(download_image))
                        .route(web::put().to(upload_image)),
                ),
        );
}

/// Register health probes. Requires [`health::HealthState`] as app data.
pub fn configure_health(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health::health_summary))
        .route("/api/health/ready", web::get().to(health::readiness_summary))
        .route("/api/health/live", web::get().to(health::liveness_check));
}
