use async_trait::async_trait;
use crate::application::errors::StorageError;

/// Store trait - abstraction for client-side key-value persistence
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Write several entries as one operation
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove several keys as one operation; readers never see a subset removed
    async fn delete_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}
