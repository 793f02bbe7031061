use thiserror::Error;

/// Outcome classes of an identity lookup.
///
/// The session layer only distinguishes a rejected credential from
/// everything else; HTTP status handling stays inside the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The backend rejected the bearer token.
    #[error("Identity service rejected the credential")]
    Unauthorized,

    /// Network failure, timeout, server error or an unreadable response.
    #[error("Identity service unavailable: {0}")]
    Transient(String),

    #[error("Identity client configuration error: {0}")]
    Config(String),
}

impl IdentityError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            return Self::Unauthorized;
        }
        Self::Transient(err.to_string())
    }
}

impl From<url::ParseError> for IdentityError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(err.to_string())
    }
}
