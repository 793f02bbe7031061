//! lessons_session - Client-side session synchronization for the life lessons platform
//!
//! This crate keeps the signed-in user's credential and profile in sync
//! between a persistent key/value store, process memory and the backend's
//! identity endpoint. It covers restore-on-start, coalesced background
//! re-validation, forced sign-out on a rejected credential and the bounded
//! re-polling used after the premium payment redirect.
//!
//! The [`SessionManager`] is built once by the application and handed to
//! consumers (route guards, header widgets), which only talk to it and never
//! to the store.

mod config;
mod identity;
mod session;
mod storage;

pub use config::{LESSONS_API_BASE_URL, LESSONS_STORE_TYPE, LESSONS_STORE_URL};

pub use identity::{HttpIdentityClient, IdentityClient, IdentityError, Role, UserRecord};

pub use session::{
    Access, AccessRequirement, ExhaustedBehavior, RetryHandle, RetryOutcome, RetryPolicy, Session,
    SessionConfig, SessionError, SessionManager, SessionStatus, Subscription, check_access,
};

pub use storage::{
    FilePersistentStore, InMemoryPersistentStore, PersistentStore, RedisPersistentStore,
    StorageError, persistent_store_from_env,
};
