//! Shared fixtures for the HTTP tests: an in-memory store implementing every
//! repository trait, and service wiring over a temporary upload directory.
#![allow(dead_code)]

use async_trait::async_trait;
use blog_service::config::StorageConfig;
use blog_service::db::{CommentRepository, ImageRepository, PostRepository};
use blog_service::models::{Comment, ImageMetadata, NewPost, Post, PostFilter, PostImageRecord};
use blog_service::{build_storage, AppServices, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct State {
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    next_post_id: i64,
    next_comment_id: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn post(&self, post_id: i64) -> Option<Post> {
        self.state.lock().unwrap().posts.get(&post_id).cloned()
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().unwrap().comments.len()
    }

    fn matches(post: &Post, filter: &PostFilter) -> bool {
        let text_ok = filter.text.as_ref().map_or(true, |text| {
            let needle = text.to_lowercase();
            post.title.to_lowercase().contains(&needle) || post.text.to_lowercase().contains(&needle)
        });
        let tags_ok = filter.tags.iter().all(|tag| post.tags.contains(tag));
        text_ok && tags_ok
    }

    fn update_counter(&self, post_id: i64, apply: impl FnOnce(&mut Post) -> i32) -> Option<i32> {
        let mut state = self.state.lock().unwrap();
        state.posts.get_mut(&post_id).map(apply)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn search(&self, filter: &PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .values()
            .rev()
            .filter(|post| Self::matches(post, filter))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .values()
            .filter(|post| Self::matches(post, filter))
            .count() as i64)
    }

    async fn find_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.post(post_id))
    }

    async fn exists(&self, post_id: i64) -> Result<bool> {
        Ok(self.state.lock().unwrap().posts.contains_key(&post_id))
    }

    async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let mut state = self.state.lock().unwrap();
        state.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: state.next_post_id,
            title: new_post.title.clone(),
            text: new_post.text.clone(),
            tags: new_post.tags.clone(),
            likes_count: 0,
            comments_count: 0,
            image_filename: None,
            image_original_name: None,
            image_size: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post_id: i64, new_post: &NewPost) -> Result<Option<Post>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.posts.get_mut(&post_id).map(|post| {
            post.title = new_post.title.clone();
            post.text = new_post.text.clone();
            post.tags = new_post.tags.clone();
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn delete(&self, post_id: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state.posts.remove(&post_id).is_some();
        if removed {
            state.comments.retain(|_, c| c.post_id != post_id);
        }
        Ok(removed)
    }

    async fn increment_likes(&self, post_id: i64) -> Result<Option<i32>> {
        Ok(self.update_counter(post_id, |p| {
            p.likes_count += 1;
            p.likes_count
        }))
    }

    async fn decrement_likes(&self, post_id: i64) -> Result<Option<i32>> {
        Ok(self.update_counter(post_id, |p| {
            p.likes_count = (p.likes_count - 1).max(0);
            p.likes_count
        }))
    }

    async fn increment_comments(&self, post_id: i64) -> Result<Option<i32>> {
        Ok(self.update_counter(post_id, |p| {
            p.comments_count += 1;
            p.comments_count
        }))
    }

    async fn decrement_comments(&self, post_id: i64) -> Result<Option<i32>> {
        Ok(self.update_counter(post_id, |p| {
            p.comments_count = (p.comments_count - 1).max(0);
            p.comments_count
        }))
    }

    async fn find_tags(&self, post_id: i64) -> Result<Vec<String>> {
        Ok(self.post(post_id).map(|p| p.tags).unwrap_or_default())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn find(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .get(&comment_id)
            .filter(|c| c.post_id == post_id)
            .cloned())
    }

    async fn create(&self, post_id: i64, text: &str) -> Result<Comment> {
        let mut state = self.state.lock().unwrap();
        match state.posts.get_mut(&post_id) {
            Some(post) => post.comments_count += 1,
            None => return Err(blog_service::AppError::post_not_found(post_id)),
        }
        state.next_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: state.next_comment_id,
            post_id,
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, post_id: i64, comment_id: i64, text: &str) -> Result<Option<Comment>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .comments
            .get_mut(&comment_id)
            .filter(|c| c.post_id == post_id)
            .map(|c| {
                c.text = text.to_string();
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn delete(&self, post_id: i64, comment_id: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let owned = state
            .comments
            .get(&comment_id)
            .map_or(false, |c| c.post_id == post_id);
        if owned {
            state.comments.remove(&comment_id);
            if let Some(post) = state.posts.get_mut(&post_id) {
                post.comments_count = (post.comments_count - 1).max(0);
            }
        }
        Ok(owned)
    }
}

#[async_trait]
impl ImageRepository for InMemoryStore {
    async fn find_image(&self, post_id: i64) -> Result<Option<PostImageRecord>> {
        Ok(self.post(post_id).map(|p| PostImageRecord {
            post_id: p.id,
            image_filename: p.image_filename,
            image_original_name: p.image_original_name,
            image_size: p.image_size,
            image_url: p.image_url,
        }))
    }

    async fn update_image(&self, post_id: i64, image: &ImageMetadata) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Ok(match state.posts.get_mut(&post_id) {
            Some(post) => {
                post.image_filename = Some(image.filename.clone());
                post.image_original_name = Some(image.original_name.clone());
                post.image_size = Some(image.size);
                post.image_url = Some(image.url.clone());
                true
            }
            None => false,
        })
    }
}

pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub services: AppServices,
    pub upload_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_max_upload(1024 * 1024)
    }

    pub fn with_max_upload(max_upload_bytes: usize) -> Self {
        let upload_dir = tempfile::tempdir().expect("create temp upload dir");
        let config = StorageConfig {
            upload_dir: upload_dir.path().to_string_lossy().into_owned(),
            default_extension: "jpg".to_string(),
            max_upload_bytes,
            image_url_prefix: "/api/posts".to_string(),
        };

        let store = Arc::new(InMemoryStore::default());
        let storage = Arc::new(build_storage(&config));
        let services = AppServices::new(
            store.clone(),
            store.clone(),
            store.clone(),
            storage,
            &config,
        );

        Self {
            store,
            services,
            upload_dir,
        }
    }

    /// Insert a post directly through the repository.
    pub async fn seed_post(&self, title: &str) -> i64 {
        let new_post = NewPost {
            title: title.to_string(),
            text: format!("Body of {}", title),
            tags: vec![],
        };
        PostRepository::create(self.store.as_ref(), &new_post)
            .await
            .expect("seed post")
            .id
    }

    pub fn stored_files(&self) -> Vec<String> {
        std::fs::read_dir(self.upload_dir.path())
            .expect("read upload dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect()
    }
}
