//! Key-value stores for the panel session

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::traits::Store;
use crate::application::errors::StorageError;

const STORE_FILE: &str = "session.json";

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    kv: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.kv.read().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        kv.remove(key);
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        for (key, value) in entries {
            kv.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        for key in keys {
            kv.remove(*key);
        }
        Ok(())
    }
}

/// JSON file-based store.
///
/// The whole map is rewritten on every mutation, through a temporary file
/// and a rename, while the write lock is held. The in-memory map only takes
/// the change once the file is written.
pub struct JsonStore {
    path: PathBuf,
    kv: Arc<RwLock<HashMap<String, String>>>,
}

impl JsonStore {
    /// Open the store under `base_path`, loading any existing file
    pub async fn open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        tokio::fs::create_dir_all(&base_path).await?;
        let path = base_path.join(STORE_FILE);

        let kv = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))?,
            Ok(_) => HashMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            kv: Arc::new(RwLock::new(kv)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, kv: &HashMap<String, String>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(kv)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let kv = self.kv.read().await;
        Ok(kv.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)]).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.delete_many(&[key]).await
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        let mut next = kv.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.to_string());
        }
        self.flush(&next).await?;
        *kv = next;
        Ok(())
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut kv = self.kv.write().await;
        if !keys.iter().any(|key| kv.contains_key(*key)) {
            return Ok(());
        }
        let mut next = kv.clone();
        for key in keys {
            next.remove(*key);
        }
        self.flush(&next).await?;
        *kv = next;
        Ok(())
    }
}
