/// Business logic layer for blog-service
///
/// - Post service: validation, search, CRUD and likes
/// - Comment service: comments scoped by post, keeping the comment counter
/// - Image service: upload and download of the image attached to a post
/// - Storage helpers: path resolution, file naming and content sniffing
pub mod comments;
pub mod content_type;
pub mod file_names;
pub mod images;
pub mod posts;
pub mod storage;

pub use comments::CommentService;
pub use content_type::ImageContentTypeDetector;
pub use file_names::FileNameGenerator;
pub use images::{ImageContent, ImageService, ImageValidator, UploadedImage};
pub use posts::{normalize_tags, PostService};
pub use storage::{FileStorageService, PathResolver};
