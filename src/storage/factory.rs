//! Storage factory
//!
//! Creates storage instances based on configuration.

use std::sync::Arc;

use crate::core::config::{StorageConfig, StorageType};
use crate::core::error::Result;
use crate::storage::{MemStore, SharedStorage};

/// Create a storage backend from configuration
pub fn create_storage(config: &StorageConfig) -> Result<MemStore> {
    match config.storage_type {
        StorageType::Memory => Ok(MemStore::new()),
    }
}

/// Create a shared storage handle for the API layer
pub fn create_shared_storage(config: &StorageConfig) -> Result<SharedStorage> {
    Ok(Arc::new(create_storage(config)?))
}
