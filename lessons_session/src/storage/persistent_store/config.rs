use std::sync::Arc;

use crate::config::{LESSONS_STORE_TYPE, LESSONS_STORE_URL};
use crate::storage::errors::StorageError;

use super::types::{
    FilePersistentStore, InMemoryPersistentStore, PersistentStore, RedisPersistentStore,
};

/// Build the persistent store selected by `LESSONS_STORE_TYPE` / `LESSONS_STORE_URL`.
pub fn persistent_store_from_env() -> Result<Arc<dyn PersistentStore>, StorageError> {
    persistent_store_for(LESSONS_STORE_TYPE.as_str(), LESSONS_STORE_URL.as_str())
}

pub(crate) fn persistent_store_for(
    store_type: &str,
    store_url: &str,
) -> Result<Arc<dyn PersistentStore>, StorageError> {
    tracing::info!(
        "Initializing persistent store with type: {}, url: {}",
        store_type,
        store_url
    );

    let store: Arc<dyn PersistentStore> = match store_type {
        "memory" => Arc::new(InMemoryPersistentStore::new()),
        "file" => Arc::new(FilePersistentStore::new(store_url)),
        "redis" => Arc::new(RedisPersistentStore::connect(store_url)?),
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'memory', 'file' and 'redis'"
            )));
        }
    };

    Ok(store)
}
