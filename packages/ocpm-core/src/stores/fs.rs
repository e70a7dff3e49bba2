//! Filesystem blob store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::traits::blob::{BlobHandle, BlobStore};

const TEMP_SUFFIX: &str = ".tmp";

/// Stores each blob as a file below a root directory.
///
/// Keys map to relative paths (`logs/abc.jsonocel` becomes
/// `<root>/logs/abc.jsonocel`). Writes go to a temporary sibling first and
/// are renamed into place, so readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root. Keys that would escape it are rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !valid {
            return Err(EngineError::storage(format!("invalid blob key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<BlobHandle> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(EngineError::storage)?;
        }

        let mut temp = path.clone().into_os_string();
        temp.push(format!(".{}{TEMP_SUFFIX}", Uuid::new_v4()));
        let temp = PathBuf::from(temp);

        fs::write(&temp, &bytes).await.map_err(EngineError::storage)?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(EngineError::storage(e));
        }

        debug!(key, bytes = bytes.len(), "Blob written");
        Ok(BlobHandle::new(key))
    }

    async fn load(&self, handle: &BlobHandle) -> Result<Vec<u8>> {
        let path = self.path_for(handle.key())?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EngineError::NotFound {
                id: handle.to_string(),
            }),
            Err(e) => Err(EngineError::storage(e)),
        }
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<()> {
        let path = self.path_for(handle.key())?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::storage(e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobHandle>> {
        let mut handles = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(EngineError::storage(e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(EngineError::storage)? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(EngineError::storage)?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(key) = key_for(&self.root, &path) else {
                    continue;
                };
                if key.starts_with(prefix) && !key.ends_with(TEMP_SUFFIX) {
                    handles.push(BlobHandle::new(key));
                }
            }
        }

        handles.sort();
        Ok(handles)
    }

    async fn exists(&self, handle: &BlobHandle) -> Result<bool> {
        let path = self.path_for(handle.key())?;
        fs::try_exists(&path).await.map_err(EngineError::storage)
    }
}

/// `/`-separated key of a file below `root`.
fn key_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    Some(parts?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn store_load_delete() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());

        let handle = store
            .store("logs/one.jsonocel", b"first".to_vec())
            .await
            .unwrap();
        assert_eq!(store.load(&handle).await.unwrap(), b"first");

        store
            .store("logs/one.jsonocel", b"second".to_vec())
            .await
            .unwrap();
        assert_eq!(store.load(&handle).await.unwrap(), b"second");

        assert_ok!(store.delete(&handle).await);
        // deleting twice is fine
        assert_ok!(store.delete(&handle).await);
        assert!(!store.exists(&handle).await.unwrap());
        assert!(matches!(
            store.load(&handle).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn list_walks_subdirectories() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.store("artifacts/a.json", b"{}".to_vec()).await.unwrap();
        store.store("artifacts/b.json", b"{}".to_vec()).await.unwrap();
        store.store("logs/a.jsonocel", b"raw".to_vec()).await.unwrap();

        let keys: Vec<String> = store
            .list("artifacts/")
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.key().to_string())
            .collect();
        assert_eq!(keys, vec!["artifacts/a.json", "artifacts/b.json"]);
        assert_eq!(store.list("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn list_on_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().join("never-created"));
        assert!(store.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_keys_outside_root() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());

        for key in ["../escape", "/etc/passwd", ""] {
            let err = assert_err!(store.store(key, b"x".to_vec()).await);
            assert!(matches!(err, EngineError::Storage(_)), "key {key:?}");
        }
    }
}
