mod config;
mod file;
mod memory;
mod redis;
mod types;

pub use config::persistent_store_from_env;
pub use types::{
    FilePersistentStore, InMemoryPersistentStore, PersistentStore, RedisPersistentStore,
};
