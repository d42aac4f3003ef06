/// Image service - upload and download of the single image attached to a post
use bytes::Bytes;
use mime::Mime;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::ImageRepository;
use crate::error::{AppError, Result};
use crate::models::ImageMetadata;
use crate::services::content_type::ImageContentTypeDetector;
use crate::services::storage::FileStorageService;

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: Option<String>,
    pub bytes: Bytes,
}

/// Stored image bytes with their sniffed content type.
#[derive(Debug, Clone)]
pub struct ImageContent {
    pub bytes: Vec<u8>,
    pub content_type: Mime,
}

/// Longest client file name kept in the image metadata.
pub const MAX_ORIGINAL_NAME_LENGTH: usize = 255;

/// Argument checks run before an upload touches storage.
#[derive(Debug, Clone, Copy)]
pub struct ImageValidator {
    max_size_bytes: usize,
}

impl ImageValidator {
    pub fn new(max_size_bytes: usize) -> Self {
        Self { max_size_bytes }
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    pub fn validate_post_id(&self, post_id: i64) -> Result<()> {
        if post_id <= 0 {
            return Err(AppError::bad_request("Post id must be positive"));
        }
        Ok(())
    }

    pub fn validate<'a>(
        &self,
        post_id: i64,
        image: Option<&'a UploadedImage>,
    ) -> Result<&'a UploadedImage> {
        self.validate_post_id(post_id)?;

        let image = image.ok_or_else(|| AppError::bad_request("Image file is required"))?;
        if image.bytes.is_empty() {
            return Err(AppError::bad_request("Image file must not be empty"));
        }
        if image.bytes.len() > self.max_size_bytes {
            return Err(AppError::bad_request(format!(
                "Image file exceeds the maximum size of {} bytes",
                self.max_size_bytes
            )));
        }
        if let Some(name) = image.original_name.as_deref() {
            if name.chars().count() > MAX_ORIGINAL_NAME_LENGTH {
                return Err(AppError::bad_request(format!(
                    "Image file name must be at most {} characters",
                    MAX_ORIGINAL_NAME_LENGTH
                )));
            }
        }

        Ok(image)
    }
}

pub struct ImageService {
    images: Arc<dyn ImageRepository>,
    storage: Arc<FileStorageService>,
    validator: ImageValidator,
    detector: ImageContentTypeDetector,
    url_prefix: String,
}

impl ImageService {
    pub fn new(
        images: Arc<dyn ImageRepository>,
        storage: Arc<FileStorageService>,
        validator: ImageValidator,
        url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            images,
            storage,
            validator,
            detector: ImageContentTypeDetector,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    /// Public URL the image of `post_id` is served from.
    pub fn image_url(&self, post_id: i64) -> String {
        format!("{}/{}/image", self.url_prefix, post_id)
    }

    /// Store a new image for the post, replacing any previous one.
    pub async fn upload(&self, post_id: i64, image: Option<UploadedImage>) -> Result<ImageMetadata> {
        let image = self.validator.validate(post_id, image.as_ref())?;

        let previous = self
            .images
            .find_image(post_id)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))?
            .metadata();

        let original_name = image.original_name.as_deref();
        let filename = self.storage.save(&image.bytes, original_name).await?;

        let metadata = ImageMetadata {
            original_name: original_name
                .map(str::to_string)
                .unwrap_or_else(|| filename.clone()),
            filename,
            size: image.bytes.len() as i64,
            url: self.image_url(post_id),
        };

        match self.images.update_image(post_id, &metadata).await {
            Ok(true) => {}
            Ok(false) => {
                // post vanished between the existence check and the update
                self.storage.delete(&metadata.filename).await;
                return Err(AppError::post_not_found(post_id));
            }
            Err(err) => {
                self.storage.delete(&metadata.filename).await;
                return Err(err);
            }
        }

        if let Some(previous) = previous {
            if previous.filename != metadata.filename {
                self.storage.delete(&previous.filename).await;
            }
        }

        info!(
            post_id,
            filename = %metadata.filename,
            size = metadata.size,
            "post image stored"
        );
        Ok(metadata)
    }

    pub async fn download(&self, post_id: i64) -> Result<ImageContent> {
        self.validator.validate_post_id(post_id)?;

        let metadata = self
            .images
            .find_image(post_id)
            .await?
            .ok_or_else(|| AppError::post_not_found(post_id))?
            .metadata()
            .ok_or_else(|| AppError::not_found(format!("Post {} has no image", post_id)))?;

        let bytes = self.storage.load(&metadata.filename).await.map_err(|err| {
            if matches!(err, AppError::NotFound(_)) {
                warn!(post_id, filename = %metadata.filename, "image metadata points to a missing file");
            }
            err
        })?;
        let content_type = self.detector.detect(&bytes);

        debug!(post_id, %content_type, size = bytes.len(), "post image loaded");
        Ok(ImageContent {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::image_repo::MockImageRepository;
    use crate::models::PostImageRecord;
    use crate::services::file_names::FileNameGenerator;
    use crate::services::storage::PathResolver;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn storage(dir: &TempDir) -> Arc<FileStorageService> {
        Arc::new(FileStorageService::new(
            PathResolver::new(dir.path()),
            FileNameGenerator::new("jpg"),
        ))
    }

    fn service(repo: MockImageRepository, storage: Arc<FileStorageService>) -> ImageService {
        ImageService::new(
            Arc::new(repo),
            storage,
            ImageValidator::new(1024),
            "/api/posts/",
        )
    }

    fn record(post_id: i64, filename: Option<&str>) -> PostImageRecord {
        PostImageRecord {
            post_id,
            image_filename: filename.map(str::to_string),
            image_original_name: filename.map(|_| "old.jpg".to_string()),
            image_size: filename.map(|_| 3),
            image_url: filename.map(|_| format!("/api/posts/{}/image", post_id)),
        }
    }

    fn upload(name: &str, bytes: &[u8]) -> Option<UploadedImage> {
        Some(UploadedImage {
            original_name: Some(name.to_string()),
            bytes: Bytes::copy_from_slice(bytes),
        })
    }

    fn stored_files(dir: &TempDir) -> Vec<String> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_validator_rejects_bad_input() {
        let validator = ImageValidator::new(4);
        let image = UploadedImage {
            original_name: None,
            bytes: Bytes::from_static(b"abc"),
        };

        assert!(validator.validate(1, Some(&image)).is_ok());
        assert!(matches!(
            validator.validate(0, Some(&image)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(validator.validate(1, None), Err(AppError::BadRequest(_))));

        let empty = UploadedImage {
            original_name: None,
            bytes: Bytes::new(),
        };
        assert!(matches!(
            validator.validate(1, Some(&empty)),
            Err(AppError::BadRequest(_))
        ));

        let large = UploadedImage {
            original_name: None,
            bytes: Bytes::from_static(b"abcde"),
        };
        assert!(matches!(
            validator.validate(1, Some(&large)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockImageRepository::new();
        repo.expect_find_image()
            .with(eq(7))
            .returning(|id| Ok(Some(record(id, None))));
        repo.expect_update_image()
            .withf(|id, image| *id == 7 && image.original_name == "cat.jpg" && image.size == 6)
            .times(1)
            .returning(|_, _| Ok(true));

        let service = service(repo, storage(&dir));
        let metadata = service.upload(7, upload("cat.jpg", JPEG)).await.unwrap();

        assert_eq!(metadata.url, "/api/posts/7/image");
        assert!(metadata.filename.ends_with(".jpg"));
        assert_eq!(stored_files(&dir), vec![metadata.filename.clone()]);
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.jpg"), b"old").unwrap();

        let mut repo = MockImageRepository::new();
        repo.expect_find_image()
            .returning(|id| Ok(Some(record(id, Some("old.jpg")))));
        repo.expect_update_image().returning(|_, _| Ok(true));

        let service = service(repo, storage(&dir));
        let metadata = service.upload(3, upload("new.png", JPEG)).await.unwrap();

        assert_eq!(stored_files(&dir), vec![metadata.filename]);
    }

    #[tokio::test]
    async fn test_upload_for_missing_post_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockImageRepository::new();
        repo.expect_find_image().returning(|_| Ok(None));
        repo.expect_update_image().never();

        let service = service(repo, storage(&dir));
        let result = service.upload(99, upload("cat.jpg", JPEG)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(stored_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_upload_removes_new_file_when_post_disappears() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockImageRepository::new();
        repo.expect_find_image()
            .returning(|id| Ok(Some(record(id, None))));
        repo.expect_update_image().returning(|_, _| Ok(false));

        let service = service(repo, storage(&dir));
        let result = service.upload(5, upload("cat.jpg", JPEG)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(stored_files(&dir).is_empty());
    }

    #[test]
    fn test_validator_limits_original_name() {
        let validator = ImageValidator::new(16);
        let named = |len: usize| UploadedImage {
            original_name: Some(format!("{}.jpg", "a".repeat(len - 4))),
            bytes: Bytes::from_static(b"abc"),
        };

        assert!(validator
            .validate(1, Some(&named(MAX_ORIGINAL_NAME_LENGTH)))
            .is_ok());
        assert!(matches!(
            validator.validate(1, Some(&named(MAX_ORIGINAL_NAME_LENGTH + 1))),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_removes_new_file_when_metadata_update_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.jpg"), b"old").unwrap();

        let mut repo = MockImageRepository::new();
        repo.expect_find_image()
            .returning(|id| Ok(Some(record(id, Some("old.jpg")))));
        repo.expect_update_image()
            .returning(|_, _| Err(AppError::DatabaseError("connection reset".into())));

        let service = service(repo, storage(&dir));
        let result = service.upload(5, upload("cat.jpg", JPEG)).await;

        assert!(matches!(result, Err(AppError::DatabaseError(_))));
        assert_eq!(stored_files(&dir), vec!["old.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_validates_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockImageRepository::new();
        repo.expect_find_image().never();

        let service = service(repo, storage(&dir));
        let result = service.upload(1, upload("cat.jpg", &[])).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_download_detects_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stored.jpg"), JPEG).unwrap();

        let mut repo = MockImageRepository::new();
        repo.expect_find_image()
            .returning(|id| Ok(Some(record(id, Some("stored.jpg")))));

        let service = service(repo, storage(&dir));
        let content = service.download(2).await.unwrap();

        assert_eq!(content.bytes, JPEG);
        assert_eq!(content.content_type, mime::IMAGE_JPEG);
    }

    #[tokio::test]
    async fn test_download_without_image_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = MockImageRepository::new();
        repo.expect_find_image()
            .with(eq(2))
            .returning(|id| Ok(Some(record(id, None))));
        repo.expect_find_image()
            .with(eq(3))
            .returning(|_| Ok(None));
        repo.expect_find_image()
            .with(eq(4))
            .returning(|id| Ok(Some(record(id, Some("gone.jpg")))));

        let service = service(repo, storage(&dir));
        assert!(matches!(service.download(2).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.download(3).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.download(4).await, Err(AppError::NotFound(_))));
    }
}
