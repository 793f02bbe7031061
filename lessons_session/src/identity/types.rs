use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of an account on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    /// Any role this client does not know about; grants nothing beyond `User`.
    #[serde(other)]
    Other,
}

/// Canonical user record as served by the identity endpoint.
///
/// Backend payloads are loosely typed, so a few aliases are accepted and
/// any field the session layer does not know about is kept in `extra` and
/// written back unchanged when the record is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "displayName")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(
        rename = "photoURL",
        alias = "photoUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "isPremium", default)]
    pub is_premium: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            photo_url: None,
            role: Role::User,
            is_premium: false,
            extra: Map::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Some deployments wrap the record as `{ "user": { ... } }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum IdentityPayload {
    Wrapped { user: UserRecord },
    Bare(UserRecord),
}

impl From<IdentityPayload> for UserRecord {
    fn from(payload: IdentityPayload) -> Self {
        match payload {
            IdentityPayload::Wrapped { user } => user,
            IdentityPayload::Bare(user) => user,
        }
    }
}
