use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::storage::errors::StorageError;

/// Durable key/value storage shared by every session manager pointing at it.
///
/// Methods take `&self`; implementations serialize access internally so a
/// store can sit behind an `Arc` and be shared between managers.
pub trait PersistentStore: Send + Sync + 'static {
    /// Get a value from the store.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Put a value into the store, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value from the store. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryPersistentStore {
    pub(super) entry: Arc<Mutex<HashMap<String, String>>>,
}

/// Store kept as a single JSON object in a file on disk.
pub struct FilePersistentStore {
    pub(super) path: PathBuf,
    pub(super) lock: Mutex<()>,
}

/// Redis-backed store using the synchronous client over one long-lived connection.
///
/// Calls block on network I/O; the session manager settles refreshes on
/// tokio's blocking pool so async workers are never held up by it.
pub struct RedisPersistentStore {
    pub(super) client: redis::Client,
    pub(super) conn: Mutex<Option<redis::Connection>>,
}
