//! Image uploads for the editor and post covers.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Key prefix all uploaded images are stored under.
pub const IMAGE_PREFIX: &str = "images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage bucket `{bucket}` does not exist")]
    BucketMissing { bucket: String },
    #[error("invalid object key `{key}`")]
    InvalidKey { key: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Metadata of an object written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub public_url: String,
    pub checksum: String,
    pub size_bytes: u64,
}

/// Object storage backend holding public assets.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<StoredObject, StorageError>;
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("`{content_type}` is not an image type")]
    NotAnImage { content_type: String },
    #[error("uploaded file exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
    #[error("image storage bucket is missing")]
    BucketMissing {
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for UploadError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::BucketMissing { .. } => UploadError::BucketMissing { source: error },
            other => UploadError::Storage(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub checksum: String,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct ImageUploadService {
    store: Arc<dyn ObjectStore>,
    max_bytes: usize,
}

impl ImageUploadService {
    pub fn new(store: Arc<dyn ObjectStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    /// Store an image under `images/<uuid>.<ext>` and return its public URL.
    ///
    /// The content type falls back to a guess from `file_name` when the
    /// client did not send one.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<UploadedImage, UploadError> {
        if data.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        if data.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }

        let content_type = content_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| {
                mime_guess::from_path(file_name)
                    .first_raw()
                    .unwrap_or("application/octet-stream")
                    .to_string()
            });
        if !content_type.starts_with("image/") {
            return Err(UploadError::NotAnImage { content_type });
        }

        let extension = image_extension(file_name, &content_type);
        let key = format!("{IMAGE_PREFIX}/{}.{extension}", Uuid::new_v4());
        let stored = self.store.put(&key, data).await?;

        counter!("folio_image_upload_total").increment(1);
        info!(
            target = "application::uploads",
            key = %stored.key,
            size_bytes = stored.size_bytes,
            "image stored"
        );

        Ok(UploadedImage {
            key: stored.key,
            url: stored.public_url,
            content_type,
            checksum: stored.checksum,
            size_bytes: stored.size_bytes,
        })
    }
}

/// Extension of the original file name, else one implied by the MIME type.
fn image_extension(file_name: &str, content_type: &str) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| {
            value
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|value| !value.is_empty());

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|extensions| extensions.first())
                .map(|extension| (*extension).to_string())
        })
        .unwrap_or_else(|| "png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        keys: Mutex<Vec<String>>,
        missing: bool,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put(&self, key: &str, data: Bytes) -> Result<StoredObject, StorageError> {
            if self.missing {
                return Err(StorageError::BucketMissing {
                    bucket: "blog-images".into(),
                });
            }
            self.keys.lock().unwrap().push(key.to_string());
            Ok(StoredObject {
                key: key.to_string(),
                public_url: format!("https://cdn.test/{key}"),
                checksum: "00".into(),
                size_bytes: data.len() as u64,
            })
        }
    }

    fn service(store: Arc<RecordingStore>) -> ImageUploadService {
        ImageUploadService::new(store, 1024)
    }

    #[tokio::test]
    async fn stores_under_images_prefix_with_original_extension() {
        let store = Arc::new(RecordingStore::default());
        let uploaded = service(store.clone())
            .upload("Photo.JPG", Some("image/jpeg"), Bytes::from_static(b"jpeg"))
            .await
            .expect("upload");

        assert!(uploaded.key.starts_with("images/"));
        assert!(uploaded.key.ends_with(".jpg"));
        assert_eq!(uploaded.url, format!("https://cdn.test/{}", uploaded.key));
        assert_eq!(store.keys.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn guesses_type_from_name_when_missing() {
        let store = Arc::new(RecordingStore::default());
        let uploaded = service(store)
            .upload("shot.png", None, Bytes::from_static(b"png"))
            .await
            .expect("upload");
        assert_eq!(uploaded.content_type, "image/png");
    }

    #[tokio::test]
    async fn rejects_empty_payload() {
        let store = Arc::new(RecordingStore::default());
        let result = service(store.clone())
            .upload("a.png", Some("image/png"), Bytes::new())
            .await;
        assert!(matches!(result, Err(UploadError::EmptyPayload)));
        assert!(store.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let store = Arc::new(RecordingStore::default());
        let result = service(store)
            .upload("notes.txt", Some("text/plain"), Bytes::from_static(b"hi"))
            .await;
        assert!(matches!(result, Err(UploadError::NotAnImage { .. })));
    }

    #[tokio::test]
    async fn rejects_oversized_payload() {
        let store = Arc::new(RecordingStore::default());
        let result = service(store)
            .upload("big.png", Some("image/png"), Bytes::from(vec![0u8; 2048]))
            .await;
        assert!(matches!(result, Err(UploadError::TooLarge { max_bytes: 1024 })));
    }

    #[tokio::test]
    async fn missing_bucket_is_distinguished() {
        let store = Arc::new(RecordingStore {
            missing: true,
            ..RecordingStore::default()
        });
        let result = service(store)
            .upload("a.png", Some("image/png"), Bytes::from_static(b"png"))
            .await;
        assert!(matches!(result, Err(UploadError::BucketMissing { .. })));
    }

    #[test]
    fn extension_falls_back_to_mime_type() {
        let ext = image_extension("clipboard", "image/png");
        assert_eq!(ext, "png");
    }
}
