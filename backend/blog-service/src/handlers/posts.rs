/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::Result;
use crate::models::{ImageMetadata, Post, PostPage};
use crate::services::PostService;

/// Maximum characters of post text shown in listings.
pub const PREVIEW_LENGTH: usize = 128;
const PREVIEW_ELLIPSIS: char = '…';

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    /// Must equal the path id when present
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Words to match; `#word` filters by tag
    pub search: Option<String>,
    /// 1-based page number (default 1)
    pub page_number: Option<i64>,
    /// Posts per page (default 10)
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub image: Option<ImageMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let image = post.image();
        Self {
            id: post.id,
            title: post.title,
            text: post.text,
            tags: post.tags,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            image,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl PostResponse {
    fn preview(post: Post) -> Self {
        let mut response = Self::from(post);
        response.text = preview_text(&response.text);
        response
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub has_prev: bool,
    pub has_next: bool,
    pub last_page: i64,
}

impl From<PostPage> for PostListResponse {
    fn from(page: PostPage) -> Self {
        let has_prev = page.has_prev();
        let has_next = page.has_next();
        let last_page = page.last_page();
        Self {
            posts: page.posts.into_iter().map(PostResponse::preview).collect(),
            has_prev,
            has_next,
            last_page,
        }
    }
}

/// First [`PREVIEW_LENGTH`] characters, with an ellipsis when cut.
pub fn preview_text(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_LENGTH) {
        Some((cut, _)) => {
            let mut preview = text[..cut].to_string();
            preview.push(PREVIEW_ELLIPSIS);
            preview
        }
        None => text.to_string(),
    }
}

/// Search posts
#[utoipa::path(
    get,
    path = "/api/posts",
    params(SearchParams),
    responses(
        (status = 200, description = "One page of posts, newest first", body = PostListResponse),
        (status = 400, description = "Invalid page arguments")
    ),
    tag = "posts"
)]
pub async fn list_posts(
    service: web::Data<PostService>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = service
        .search(query.search.as_deref(), query.page_number, query.page_size)
        .await?;

    Ok(HttpResponse::Ok().json(PostListResponse::from(page)))
}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 404, description = "Post not found")
    ),
    tag = "posts"
)]
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = service.get(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// Create a new post
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid title, text or tags")
    ),
    tag = "posts"
)]
pub async fn create_post(
    service: web::Data<PostService>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.create(&req.title, &req.text, &req.tags).await?;
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// Replace title, text and tags of a post
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid input or id mismatch"),
        (status = 404, description = "Post not found")
    ),
    tag = "posts"
)]
pub async fn update_post(
    service: web::Data<PostService>,
    post_id: web::Path<i64>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let post = service
        .update(post_id.into_inner(), req.id, &req.title, &req.text, &req.tags)
        .await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// Delete a post with its comments and image
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 404, description = "Post not found")
    ),
    tag = "posts"
)]
pub async fn delete_post(
    service: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    service.delete(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Add a like, returning the new count
#[utoipa::path(
    post,
    path = "/api/posts/{id}/likes",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "New likes count", body = i32),
        (status = 404, description = "Post not found")
    ),
    tag = "posts"
)]
pub async fn like_post(
    service: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let likes = service.like(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(likes))
}

/// Remove a like, returning the new count (never below zero)
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/likes",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "New likes count", body = i32),
        (status = 404, description = "Post not found")
    ),
    tag = "posts"
)]
pub async fn unlike_post(
    service: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let likes = service.unlike(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(likes))
}

/// Tags of a post, sorted
#[utoipa::path(
    get,
    path = "/api/posts/{id}/tags",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Tag names", body = Vec<String>),
        (status = 404, description = "Post not found")
    ),
    tag = "posts"
)]
pub async fn get_post_tags(
    service: web::Data<PostService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let tags = service.find_tags(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tags))
}
