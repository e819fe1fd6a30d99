use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{User, UserRole};

/// Caller resolved from a `userId` + `loginToken` pair.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

impl Identity {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            display_name: user.display_name(),
            role: user.role,
        }
    }
}

/// Emails are matched case-insensitively and without surrounding whitespace.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Login tokens are opaque and compared by equality.
#[must_use]
pub fn new_login_token() -> String {
    Uuid::new_v4().to_string()
}
