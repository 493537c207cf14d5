use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An author. Owns posts; identified on the wire by `id` in the bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always stored in [`normalize_email`] form.
    pub email: String,
    /// PHC string produced by the password service.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emails compare case-insensitively; lookups and inserts both go through this.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
