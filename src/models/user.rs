use serde::{Deserialize, Serialize};

/// Row of the `users` table.
///
/// The password is kept exactly as submitted. This mirrors the demo's
/// credential store and is not a security model.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: i64,
}

impl UserRecord {
    pub fn new(username: String, password: String) -> Self {
        Self {
            username,
            password,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}
