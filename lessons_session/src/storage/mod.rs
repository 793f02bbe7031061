mod errors;
mod persistent_store;

pub use errors::StorageError;
pub use persistent_store::{
    FilePersistentStore, InMemoryPersistentStore, PersistentStore, RedisPersistentStore,
    persistent_store_from_env,
};
