use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::identity::UserRecord;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Unauthenticated,
    /// Persisted state has not been read yet.
    Restoring,
    Authenticated,
    /// Authenticated, with a re-validation round-trip in flight.
    Syncing,
}

impl SessionStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::Syncing)
    }
}

/// Snapshot of the client-held session.
///
/// `user` and `token` are both present exactly when the status is
/// authenticated. Snapshots are copies; mutating one has no effect on the
/// manager that produced it.
#[derive(Clone, PartialEq, Serialize)]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<UserRecord>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            user: None,
            token: None,
            last_synced_at: None,
        }
    }

    pub(crate) fn restoring() -> Self {
        Self {
            status: SessionStatus::Restoring,
            ..Self::unauthenticated()
        }
    }

    pub(crate) fn authenticated(
        token: String,
        user: UserRecord,
        last_synced_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
            token: Some(token),
            last_synced_at,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserRecord::is_admin)
    }

    pub fn is_premium(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_premium)
    }
}

// The credential never ends up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("last_synced_at", &self.last_synced_at)
            .finish()
    }
}

/// Store keys holding the persisted credential and user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionKeys {
    pub(crate) token: String,
    pub(crate) user: String,
}

impl SessionKeys {
    pub(crate) fn with_prefix(prefix: &str) -> Self {
        Self {
            token: format!("{prefix}:token"),
            user: format!("{prefix}:user"),
        }
    }
}
