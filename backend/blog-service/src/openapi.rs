/// OpenAPI documentation for Blog Service
use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

use crate::handlers::{comments, images, posts};
use crate::models::ImageMetadata;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog Service API",
        version = "1.0.0",
        description = "REST backend for a blog: posts with tags, likes and an optional image, plus comments attached to posts.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    paths(
        posts::list_posts,
        posts::get_post,
        posts::create_post,
        posts::update_post,
        posts::delete_post,
        posts::like_post,
        posts::unlike_post,
        posts::get_post_tags,
        comments::list_comments,
        comments::get_comment,
        comments::create_comment,
        comments::update_comment,
        comments::delete_comment,
        images::upload_image,
        images::download_image,
    ),
    components(schemas(
        posts::CreatePostRequest,
        posts::UpdatePostRequest,
        posts::PostResponse,
        posts::PostListResponse,
        comments::CreateCommentRequest,
        comments::UpdateCommentRequest,
        comments::CommentResponse,
        ImageMetadata,
    )),
    tags(
        (name = "posts", description = "Post search, creation, updates, deletion and likes"),
        (name = "comments", description = "Comments attached to a post"),
        (name = "images", description = "Image attached to a post"),
    ),
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/openapi.json"
    }
}

pub async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = doc.to_json().map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}
