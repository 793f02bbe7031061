mod client;
mod errors;
mod types;

pub use client::{HttpIdentityClient, IdentityClient};
pub use errors::IdentityError;
pub use types::{Role, UserRecord};
