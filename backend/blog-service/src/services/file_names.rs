/// Collision-resistant names for stored image files
use chrono::Utc;
use rand::Rng;
use std::path::Path;

const MAX_EXTENSION_LEN: usize = 10;

/// Builds `<unix-millis>_<8 hex chars>.<ext>` names.
#[derive(Debug, Clone)]
pub struct FileNameGenerator {
    default_extension: String,
}

impl FileNameGenerator {
    /// Falls back to `bin` when `default_extension` sanitizes to nothing.
    pub fn new(default_extension: &str) -> Self {
        let default_extension =
            sanitize_extension(default_extension).unwrap_or_else(|| "bin".to_string());
        Self { default_extension }
    }

    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    pub fn generate(&self, original_name: Option<&str>) -> String {
        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(sanitize_extension)
            .unwrap_or_else(|| self.default_extension.clone());

        let suffix: u32 = rand::thread_rng().gen();

        format!(
            "{}_{:08x}.{}",
            Utc::now().timestamp_millis(),
            suffix,
            extension
        )
    }
}

/// Lowercase ASCII alphanumerics only, capped in length.
fn sanitize_extension(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
