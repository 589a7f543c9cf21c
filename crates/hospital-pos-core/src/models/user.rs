//! Operator accounts.

use serde::{Deserialize, Serialize};

/// A terminal operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique login name
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Inline `data:` URL
    pub profile_image: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
            profile_image: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
