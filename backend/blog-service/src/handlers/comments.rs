/// Comment handlers - HTTP endpoints for comments under a post
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::Comment;
use crate::services::CommentService;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub text: String,
    /// Must equal the path post id when present
    #[serde(default)]
    pub post_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
    #[serde(default)]
    pub post_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            text: comment.text,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Comments of a post, oldest first
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Comments of the post", body = Vec<CommentResponse>),
        (status = 404, description = "Post not found")
    ),
    tag = "comments"
)]
pub async fn list_comments(
    service: web::Data<CommentService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let comments: Vec<CommentResponse> = service
        .list(post_id.into_inner())
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(comments))
}

/// Get a single comment
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments/{comment_id}",
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "The comment", body = CommentResponse),
        (status = 404, description = "Comment not found for this post")
    ),
    tag = "comments"
)]
pub async fn get_comment(
    service: web::Data<CommentService>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = service.get(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

/// Create a new comment
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Empty text or id mismatch"),
        (status = 404, description = "Post not found")
    ),
    tag = "comments"
)]
pub async fn create_comment(
    service: web::Data<CommentService>,
    post_id: web::Path<i64>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = service
        .create(post_id.into_inner(), req.post_id, &req.text)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

/// Update a comment
#[utoipa::path(
    put,
    path = "/api/posts/{id}/comments/{comment_id}",
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Empty text or id mismatch"),
        (status = 404, description = "Comment not found for this post")
    ),
    tag = "comments"
)]
pub async fn update_comment(
    service: web::Data<CommentService>,
    path: web::Path<(i64, i64)>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = service
        .update(post_id, comment_id, req.post_id, req.id, &req.text)
        .await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/comments/{comment_id}",
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 404, description = "Comment not found for this post")
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    service: web::Data<CommentService>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    service.delete(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().finish())
}
