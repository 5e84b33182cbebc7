//! Filesystem-backed object store for uploaded images.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

use crate::application::uploads::{ObjectStore, StorageError, StoredObject};

/// Objects live under `root`; each key is served at `public_base_url/<key>`.
#[derive(Debug, Clone)]
pub struct FilesystemObjectStore {
    root: PathBuf,
    public_base_url: Url,
}

impl FilesystemObjectStore {
    /// The bucket directory is not created here: a missing root surfaces as
    /// [`StorageError::BucketMissing`] on the first write.
    pub fn new(root: PathBuf, public_base_url: Url) -> Self {
        let public_base_url = with_trailing_slash(public_base_url);
        Self {
            root,
            public_base_url,
        }
    }

    /// Create the bucket directory if absent.
    pub fn ensure_bucket(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_url(&self, key: &str) -> String {
        self.public_base_url
            .join(key)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{key}", self.public_base_url))
    }

    /// Read an object back; `None` when it does not exist.
    pub async fn read(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        let absolute = self.resolve(key)?;
        match fs::read(&absolute).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Absolute path for `key`, rejecting absolute and parent-relative keys.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }

        Ok(self.root.join(relative))
    }

    fn bucket_name(&self) -> String {
        self.root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("uploads")
            .to_string()
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<StoredObject, StorageError> {
        let absolute = self.resolve(key)?;

        if !fs::try_exists(&self.root).await.unwrap_or(false) {
            return Err(StorageError::BucketMissing {
                bucket: self.bucket_name(),
            });
        }

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        let checksum = hex::encode(Sha256::digest(&data));

        Ok(StoredObject {
            key: key.to_string(),
            public_url: self.public_url(key),
            checksum,
            size_bytes: data.len() as u64,
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: PathBuf) -> FilesystemObjectStore {
        let base = Url::parse("https://media.example.com/blog-images").expect("valid url");
        FilesystemObjectStore::new(root, base)
    }

    #[tokio::test]
    async fn writes_object_and_reports_public_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path().to_path_buf());

        let stored = store
            .put("images/abc.png", Bytes::from_static(b"png-bytes"))
            .await
            .expect("put succeeds");

        assert_eq!(
            stored.public_url,
            "https://media.example.com/blog-images/images/abc.png"
        );
        assert_eq!(stored.size_bytes, 9);
        assert_eq!(stored.checksum.len(), 64);

        let on_disk = std::fs::read(dir.path().join("images/abc.png")).expect("file exists");
        assert_eq!(on_disk, b"png-bytes");
    }

    #[tokio::test]
    async fn missing_root_is_bucket_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path().join("absent"));

        let result = store
            .put("images/abc.png", Bytes::from_static(b"x"))
            .await;
        assert!(matches!(
            result,
            Err(StorageError::BucketMissing { ref bucket }) if bucket == "absent"
        ));
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path().to_path_buf());

        for key in ["../escape.png", "/etc/passwd", ""] {
            let result = store.put(key, Bytes::from_static(b"x")).await;
            assert!(
                matches!(result, Err(StorageError::InvalidKey { .. })),
                "key {key:?}"
            );
        }
    }

    #[tokio::test]
    async fn reads_back_stored_objects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path().to_path_buf());
        store
            .put("images/a.gif", Bytes::from_static(b"gif"))
            .await
            .expect("put");

        let found = store.read("images/a.gif").await.expect("read");
        assert_eq!(found.as_deref(), Some(&b"gif"[..]));
        assert_eq!(store.read("images/absent.gif").await.expect("read"), None);
        assert!(store.read("../a.gif").await.is_err());
    }

    #[test]
    fn ensure_bucket_creates_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path().join("bucket"));
        store.ensure_bucket().expect("create");
        assert!(store.root().is_dir());
    }
}
