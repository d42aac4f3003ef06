/// Local file storage for post images
///
/// All paths go through [`PathResolver`], which keeps every resolved path
/// inside the configured upload directory.
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::services::file_names::FileNameGenerator;

/// Resolves file names against a base directory, lexically.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Rejects absolute names and any name whose `..` components climb above
    /// the base, as well as names resolving to the base itself.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if filename.trim().is_empty() {
            return Err(AppError::bad_request("File name must not be empty"));
        }

        let mut resolved = self.base.clone();
        let mut depth = 0usize;

        for component in Path::new(filename).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(escapes_base(filename));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(escapes_base(filename));
                }
            }
        }

        if depth == 0 {
            return Err(escapes_base(filename));
        }

        Ok(resolved)
    }
}

fn escapes_base(filename: &str) -> AppError {
    AppError::Security(format!(
        "path '{}' resolves outside the upload directory",
        filename
    ))
}

/// Saves, loads and deletes image files under the upload directory.
#[derive(Debug, Clone)]
pub struct FileStorageService {
    resolver: PathResolver,
    names: FileNameGenerator,
}

impl FileStorageService {
    pub fn new(resolver: PathResolver, names: FileNameGenerator) -> Self {
        Self { resolver, names }
    }

    pub fn base_dir(&self) -> &Path {
        self.resolver.base()
    }

    /// Create the upload directory if it is missing.
    pub async fn ensure_base_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.base_dir()).await?;
        Ok(())
    }

    /// Write `bytes` under a freshly generated name and return that name.
    pub async fn save(&self, bytes: &[u8], original_name: Option<&str>) -> Result<String> {
        self.ensure_base_dir().await?;

        let filename = self.names.generate(original_name);
        let path = self.resolver.resolve(&filename)?;
        tokio::fs::write(&path, bytes).await?;

        debug!(%filename, size = bytes.len(), "stored image file");
        Ok(filename)
    }

    pub async fn load(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.resolver.resolve(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(AppError::not_found(format!(
                "Image file {} not found",
                filename
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Best effort: failures are logged, never returned.
    pub async fn delete(&self, filename: &str) -> bool {
        let path = match self.resolver.resolve(filename) {
            Ok(path) => path,
            Err(err) => {
                warn!(%filename, error = %err, "refusing to delete file");
                return false;
            }
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%filename, "deleted image file");
                true
            }
            Err(err) => {
                warn!(%filename, error = %err, "failed to delete image file");
                false
            }
        }
    }
}
