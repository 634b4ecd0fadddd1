//! # Image Blob Store
//!
//! Listing photos live outside the database. The handlers only see the
//! [`BlobStore`] trait: push bytes in, get an [`ImageRef`] (public URL plus
//! storage key) back, and delete by key later.
//!
//! [`LocalBlobStore`] writes files to a directory that the router serves
//! under the configured base URL. A hosted provider would implement the
//! same trait.

use crate::db::models::ImageRef;
use async_trait::async_trait;
use axum::body::Bytes;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// An uploaded file waiting to be stored.
#[derive(Debug, Clone)]
pub struct Upload {
    /// File name as sent by the browser (informational only)
    pub file_name: String,
    /// MIME type from the multipart part, e.g. `image/png`
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid blob key '{0}'")]
    InvalidKey(String),

    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// Storage provider for listing images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `upload` and return where it can be fetched from.
    async fn store(&self, upload: Upload) -> Result<ImageRef, BlobError>;

    /// Remove a previously stored blob. Deleting an unknown key is not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, upload: Upload) -> Result<ImageRef, BlobError> {
        let key = format!("{}.{}", Uuid::new_v4(), extension_for(&upload.content_type));
        let path = self.path_for(&key)?;

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, &upload.bytes).await?;

        tracing::debug!(key = %key, bytes = upload.bytes.len(), "Stored image");

        Ok(ImageRef {
            url: format!("{}/{}", self.base_url, key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}

/// Keys are flat file names; anything that could walk out of the root is refused.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "img",
    }
}

/// Store every upload, or none of them.
///
/// If one upload fails, the ones already stored are deleted again before
/// the error is returned.
pub async fn store_all(blobs: &dyn BlobStore, uploads: Vec<Upload>) -> Result<Vec<ImageRef>, BlobError> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match blobs.store(upload).await {
            Ok(image) => stored.push(image),
            Err(e) => {
                let keys = stored.into_iter().map(|image| image.key).collect();
                discard(blobs, keys).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Best-effort delete. Failures are logged and otherwise ignored; an
/// orphaned blob is harmless.
pub async fn discard(blobs: &dyn BlobStore, keys: Vec<String>) {
    for key in keys {
        if let Err(e) = blobs.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "Could not delete image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("campground-blobs-{}", Uuid::new_v4()))
    }

    fn png(bytes: &'static [u8]) -> Upload {
        Upload {
            file_name: "tent.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_public_url() {
        let root = temp_root();
        let store = LocalBlobStore::new(&root, "/uploads");

        let image = store.store(png(b"not really a png")).await.unwrap();

        assert!(image.key.ends_with(".png"));
        assert_eq!(image.url, format!("/uploads/{}", image.key));
        let written = tokio::fs::read(root.join(&image.key)).await.unwrap();
        assert_eq!(written, b"not really a png");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_file_and_tolerates_missing_keys() {
        let root = temp_root();
        let store = LocalBlobStore::new(&root, "/uploads");
        let image = store.store(png(b"x")).await.unwrap();

        store.delete(&image.key).await.unwrap();
        assert!(!root.join(&image.key).exists());

        // Second delete of the same key is a no-op.
        store.delete(&image.key).await.unwrap();

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn discard_keeps_going_past_bad_keys() {
        let root = temp_root();
        let store = LocalBlobStore::new(&root, "/uploads");
        let first = store.store(png(b"1")).await.unwrap();
        let second = store.store(png(b"2")).await.unwrap();

        discard(&store, vec![first.key.clone(), "../outside".to_string(), second.key.clone()]).await;

        assert!(!root.join(&first.key).exists());
        assert!(!root.join(&second.key).exists());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("nested/key.png")]
    #[case(".hidden")]
    #[case("")]
    fn keys_that_escape_the_root_are_rejected(#[case] key: &str) {
        assert!(matches!(validate_key(key), Err(BlobError::InvalidKey(_))));
    }

    #[rstest]
    #[case("image/jpeg", "jpg")]
    #[case("image/png", "png")]
    #[case("image/webp", "webp")]
    #[case("image/svg+xml", "img")]
    #[case("image/x-unknown", "img")]
    fn extension_follows_content_type(#[case] content_type: &str, #[case] expected: &str) {
        assert_eq!(extension_for(content_type), expected);
    }
}
