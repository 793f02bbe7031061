mod config;
mod errors;
mod main;
mod types;

pub use config::{ExhaustedBehavior, RetryPolicy, SessionConfig};
pub use errors::SessionError;
pub use main::{
    Access, AccessRequirement, RetryHandle, RetryOutcome, SessionManager, Subscription,
    check_access,
};
pub use types::{Session, SessionStatus};
