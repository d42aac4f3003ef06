/// Image handlers - multipart upload and raw download of a post image
use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition};
use actix_web::{web, HttpResponse};
use bytes::BytesMut;
use futures_util::stream::StreamExt;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::{ImageService, UploadedImage};

/// Multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";

fn content_disposition(field: &actix_multipart::Field) -> Option<ContentDisposition> {
    field
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| ContentDisposition::from_raw(value).ok())
}

/// Read the `image` field, enforcing `max_bytes` while streaming.
/// Other fields are drained and ignored.
async fn read_image_field(payload: &mut Multipart, max_bytes: usize) -> Result<Option<UploadedImage>> {
    let mut image = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?;

        let disposition = content_disposition(&field);
        let is_image = disposition.as_ref().and_then(|cd| cd.get_name()) == Some(IMAGE_FIELD);
        let original_name = disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::bad_request(format!("Error reading upload field: {}", e)))?;
            if !is_image {
                continue;
            }
            if buffer.len() + chunk.len() > max_bytes {
                return Err(AppError::bad_request(format!(
                    "Image file exceeds the maximum size of {} bytes",
                    max_bytes
                )));
            }
            buffer.extend_from_slice(&chunk);
        }

        if is_image && image.is_none() {
            debug!(size = buffer.len(), original_name = ?original_name, "received image field");
            image = Some(UploadedImage {
                original_name,
                bytes: buffer.freeze(),
            });
        }
    }

    Ok(image)
}

/// Upload or replace the image of a post
#[utoipa::path(
    put,
    path = "/api/posts/{id}/image",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Image stored", body = crate::models::ImageMetadata),
        (status = 400, description = "Missing, empty or oversized image"),
        (status = 404, description = "Post not found")
    ),
    tag = "images"
)]
pub async fn upload_image(
    service: web::Data<ImageService>,
    post_id: web::Path<i64>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    service.validator().validate_post_id(post_id)?;

    let max_bytes = service.validator().max_size_bytes();
    let image = read_image_field(&mut payload, max_bytes).await?;
    let metadata = service.upload(post_id, image).await?;

    Ok(HttpResponse::Ok().json(metadata))
}

/// Download the image of a post with its detected content type
#[utoipa::path(
    get,
    path = "/api/posts/{id}/image",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Post or image not found")
    ),
    tag = "images"
)]
pub async fn download_image(
    service: web::Data<ImageService>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let content = service.download(post_id.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .content_type(content.content_type)
        .body(content.bytes))
}
