mod guard;
mod manager;
mod persistence;
mod retry;
mod subscribers;

#[cfg(test)]
pub(crate) mod test_utils;

pub use guard::{Access, AccessRequirement, check_access};
pub use manager::SessionManager;
pub use retry::{RetryHandle, RetryOutcome};
pub use subscribers::Subscription;
