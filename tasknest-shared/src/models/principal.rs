/// Authenticated principal
///
/// Created by the identity provider at sign-up. The sync core only reads
/// `id` (the owner filter value) and `email_verified`.

use serde::{Deserialize, Serialize};

/// The authenticated identity of the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Opaque provider id, stored as `userId` on every owned record
    pub id: String,

    /// Sign-in email
    pub email: String,

    /// Whether the email address has been verified
    pub email_verified: bool,
}

impl Principal {
    /// Creates a principal
    pub fn new(id: impl Into<String>, email: impl Into<String>, email_verified: bool) -> Self {
        Principal {
            id: id.into(),
            email: email.into(),
            email_verified,
        }
    }
}
