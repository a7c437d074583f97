//! User entity.
//!
//! Users are an external collaborator from the placement core's point of
//! view: orders reference them by identifier only, and the core never
//! validates user existence beyond passing the identifier through.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

/// A registered user, looked up or created by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Minimal shape check for an email address: `local@domain.tld`.
pub fn email_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Default username for a new user: the email local part.
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(email_is_valid("alice@example.com"));
        assert!(email_is_valid("a.b+c@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!email_is_valid("not-an-email"));
        assert!(!email_is_valid("@example.com"));
        assert!(!email_is_valid("alice@"));
        assert!(!email_is_valid("alice@nodot"));
        assert!(!email_is_valid("alice smith@example.com"));
    }

    #[test]
    fn username_defaults_to_local_part() {
        assert_eq!(username_from_email("alice@example.com"), "alice");
    }
}
