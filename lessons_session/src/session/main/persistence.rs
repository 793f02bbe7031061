use crate::identity::UserRecord;
use crate::session::types::SessionKeys;
use crate::storage::{PersistentStore, StorageError};

/// Read the persisted credential pair.
///
/// Anything short of a complete, parseable pair is treated as no session.
/// Malformed or half-present state is cleared so the next start is clean.
pub(super) fn load(store: &dyn PersistentStore, keys: &SessionKeys) -> Option<(String, UserRecord)> {
    let token = read(store, &keys.token)?.filter(|t| !t.is_empty());
    let raw_user = read(store, &keys.user)?;

    match (token, raw_user) {
        (None, None) => None,
        (Some(token), Some(raw_user)) => match serde_json::from_str::<UserRecord>(&raw_user) {
            Ok(user) => Some((token, user)),
            Err(e) => {
                tracing::warn!("Discarding malformed persisted user record: {}", e);
                discard(store, keys);
                None
            }
        },
        _ => {
            tracing::warn!("Discarding incomplete persisted session (token and user must both be present)");
            discard(store, keys);
            None
        }
    }
}

pub(super) fn save(
    store: &dyn PersistentStore,
    keys: &SessionKeys,
    token: &str,
    user: &UserRecord,
) -> Result<(), StorageError> {
    save_user(store, keys, user)?;
    store.set(&keys.token, token)
}

pub(super) fn save_user(
    store: &dyn PersistentStore,
    keys: &SessionKeys,
    user: &UserRecord,
) -> Result<(), StorageError> {
    let value = serde_json::to_string(user)?;
    store.set(&keys.user, &value)
}

/// Remove both keys, attempting the second even if the first removal fails.
pub(super) fn clear(store: &dyn PersistentStore, keys: &SessionKeys) -> Result<(), StorageError> {
    let token_result = store.remove(&keys.token);
    let user_result = store.remove(&keys.user);
    token_result.and(user_result)
}

// Outer `None` means the store could not be read at all.
fn read(store: &dyn PersistentStore, key: &str) -> Option<Option<String>> {
    match store.get(key) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to read '{}' from persistent store: {}", key, e);
            None
        }
    }
}

fn discard(store: &dyn PersistentStore, keys: &SessionKeys) {
    if let Err(e) = clear(store, keys) {
        tracing::error!("Failed to clear persisted session: {}", e);
    }
}
