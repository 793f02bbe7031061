use crate::session::types::{Session, SessionStatus};

/// What a protected view requires from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    Authenticated,
    Admin,
    Premium,
}

/// Decision a route guard acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Persisted state is still being read; show a loading state.
    Pending,
    RedirectToLogin,
    /// Signed in, but lacking the role or entitlement.
    Forbidden,
}

pub fn check_access(session: &Session, requirement: AccessRequirement) -> Access {
    match session.status {
        SessionStatus::Restoring => Access::Pending,
        SessionStatus::Unauthenticated => Access::RedirectToLogin,
        SessionStatus::Authenticated | SessionStatus::Syncing => {
            let allowed = match requirement {
                AccessRequirement::Authenticated => true,
                AccessRequirement::Admin => session.is_admin(),
                AccessRequirement::Premium => session.is_premium(),
            };
            if allowed {
                Access::Granted
            } else {
                Access::Forbidden
            }
        }
    }
}
