/// Configuration management for Blog Service
///
/// Loaded once at startup from environment variables (a `.env` file is read
/// first by `main`).
use db_pool::env_utils::{env_list, env_or, parse_env_with_default};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Image storage configuration
    pub storage: StorageConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of HTTP worker threads
    pub workers: usize,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; a single `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Image storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded images are written to
    pub upload_dir: String,
    /// Extension used when the uploaded file name has none
    pub default_extension: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Prefix of the public image URL, followed by `/{post_id}/image`
    pub image_url_prefix: String,
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig {
            env: env_or("APP_ENV", "development"),
            host: env_or("BLOG_SERVICE_HOST", "0.0.0.0"),
            port: parse_env_with_default("BLOG_SERVICE_PORT", DEFAULT_PORT),
            workers: parse_env_with_default("BLOG_SERVICE_WORKERS", DEFAULT_WORKERS).max(1),
        };

        let cors = {
            let configured = std::env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .filter(|v| !v.trim().is_empty());
            if configured.is_none() && app.is_production() {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string());
            }

            let cors = CorsConfig {
                allowed_origins: env_list("CORS_ALLOWED_ORIGINS", "http://localhost:3000"),
            };
            if app.is_production() && cors.allows_any_origin() {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }
            cors
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .map_err(|_| "DATABASE_URL environment variable not set".to_string())?,
            max_connections: parse_env_with_default("DB_MAX_CONNECTIONS", 10),
        };

        let storage = StorageConfig {
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            default_extension: env_or("IMAGE_DEFAULT_EXTENSION", "jpg"),
            max_upload_bytes: parse_env_with_default(
                "IMAGE_MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
            image_url_prefix: env_or("IMAGE_URL_PREFIX", "/api/posts"),
        };
        if storage.max_upload_bytes == 0 {
            return Err("IMAGE_MAX_UPLOAD_BYTES must be positive".to_string());
        }

        Ok(Config {
            app,
            cors,
            database,
            storage,
        })
    }

    /// `host:port` the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
