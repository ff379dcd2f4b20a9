//! Filesystem image store
//!
//! Images are written flat into one directory under generated names; the
//! name is the reference handed back to callers and served under `/uploads`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::application::ports::{GatewayError, ImageStore};

/// Extensions accepted for uploaded images.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    /// Create the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a reference to a path inside the root, refusing anything that
    /// could escape it.
    fn resolve(&self, image_ref: &str) -> Result<PathBuf, GatewayError> {
        let valid = !image_ref.is_empty()
            && image_ref
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !image_ref.starts_with('.');
        if !valid {
            return Err(GatewayError::InvalidInput(format!("Invalid image reference: {}", image_ref)));
        }
        Ok(self.root.join(image_ref))
    }
}

pub fn normalize_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().copied().find(|allowed| *allowed == ext)
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<String, GatewayError> {
        let ext = normalize_extension(extension)
            .ok_or_else(|| GatewayError::InvalidInput(format!("Unsupported image type: {}", extension)))?;
        let image_ref = format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple(),
            ext
        );

        tokio::fs::write(self.resolve(&image_ref)?, bytes)
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to store image: {}", e)))?;

        debug!(image_ref = %image_ref, size = bytes.len(), "Image stored");
        Ok(image_ref)
    }

    async fn load(&self, image_ref: &str) -> Result<Vec<u8>, GatewayError> {
        tokio::fs::read(self.resolve(image_ref)?)
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to read image {}: {}", image_ref, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::open(dir.path().join("uploads")).await.unwrap();

        let image_ref = store.save(b"jpeg-bytes", "JPG").await.unwrap();
        assert!(image_ref.ends_with(".jpg"));
        assert_eq!(store.load(&image_ref).await.unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn rejects_traversal_and_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::open(dir.path()).await.unwrap();

        assert!(store.load("../secret").await.is_err());
        assert!(store.load(".hidden").await.is_err());
        assert!(store.save(b"x", "exe").await.is_err());
    }
}
