use thiserror::Error;

use crate::identity::IdentityError;
use crate::storage::StorageError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No authenticated session")]
    NotAuthenticated,

    /// Error from the identity service during sign-in
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
