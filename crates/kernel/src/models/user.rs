//! User accounts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::choices::Role;

/// User record. Email is the unique login identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub role: Role,
    pub is_verified: bool,
    pub created: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, id: Uuid, now: DateTime<Utc>) -> User {
        User {
            id,
            email: normalize_email(&self.email),
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            date_of_birth: self.date_of_birth,
            role: self.role,
            is_verified: false,
            created: now,
        }
    }
}

/// Emails compare case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email() {
        let user = NewUser {
            email: "  Marko@Example.COM ".to_string(),
            first_name: "Marko".to_string(),
            last_name: "Marković".to_string(),
            ..Default::default()
        }
        .into_user(Uuid::nil(), Utc::now());

        assert_eq!(user.email, "marko@example.com");
        assert_eq!(user.role, Role::User);
        assert!(!user.is_verified);
        assert_eq!(user.first_name, "Marko");
    }
}
