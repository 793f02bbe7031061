use redis::Commands;
use std::sync::{Mutex, PoisonError};

use crate::storage::errors::StorageError;

use super::types::{PersistentStore, RedisPersistentStore};

const STORE_PREFIX: &str = "session";

impl RedisPersistentStore {
    /// Open a client and verify the server answers before handing the store out.
    pub fn connect(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_connection()?;
        let _: String = redis::cmd("PING").query(&mut conn)?;
        tracing::info!("Connected to redis persistent store at {}", url);
        Ok(Self {
            client,
            conn: Mutex::new(Some(conn)),
        })
    }

    fn make_key(key: &str) -> String {
        format!("{STORE_PREFIX}:{key}")
    }

    /// Run `op` on the shared connection, reconnecting if the last one failed.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> Result<T, StorageError> {
        let mut slot = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => {
                tracing::debug!("Reconnecting to redis persistent store");
                self.client.get_connection()?
            }
        };

        let result = op(&mut conn);
        // A failed command may leave the connection unusable; drop it and reconnect next time
        if result.is_ok() {
            *slot = Some(conn);
        }
        Ok(result?)
    }
}

impl PersistentStore for RedisPersistentStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_connection(|conn| conn.get(Self::make_key(key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_connection(|conn| conn.set(Self::make_key(key), value))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_connection(|conn| conn.del(Self::make_key(key)))
    }
}
