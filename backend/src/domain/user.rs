//! User account entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::auth::PasswordHash;
use super::email::EmailAddress;

/// Stable user identifier (database surrogate key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl User {
    /// Whether the account may authenticate at all.
    pub fn can_authenticate(&self) -> bool {
        self.is_active
    }
}

/// Input for creating a new account.
///
/// Regular registrations leave the staff flags unset; the
/// `createsuperuser` binary constructs drafts with both flags raised.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    /// Draft a regular account.
    pub fn registration(email: EmailAddress, password_hash: PasswordHash, name: String) -> Self {
        Self {
            email,
            password_hash,
            name,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Draft a superuser account with staff and superuser flags raised.
    pub fn superuser(email: EmailAddress, password_hash: PasswordHash) -> Self {
        Self {
            email,
            password_hash,
            name: String::new(),
            is_staff: true,
            is_superuser: true,
        }
    }
}

/// Partial update of a user's own profile.
///
/// `None` fields are left untouched; a present `password_hash` replaces the
/// stored credential.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<EmailAddress>,
    pub name: Option<String>,
    pub password_hash: Option<PasswordHash>,
}

impl ProfileUpdate {
    /// Whether the update would change anything.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.password_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(is_active: bool) -> User {
        User {
            id: UserId::new(1),
            email: EmailAddress::parse("test@example.com").expect("valid email"),
            password_hash: PasswordHash::from_phc_string("$argon2id$stub"),
            name: "Test Name".into(),
            is_active,
            is_staff: false,
            is_superuser: false,
        }
    }

    #[test]
    fn inactive_accounts_cannot_authenticate() {
        assert!(sample_user(true).can_authenticate());
        assert!(!sample_user(false).can_authenticate());
    }

    #[test]
    fn superuser_draft_raises_both_flags() {
        let draft = NewUser::superuser(
            EmailAddress::parse("admin@example.com").expect("valid email"),
            PasswordHash::from_phc_string("$argon2id$stub"),
        );
        assert!(draft.is_staff);
        assert!(draft.is_superuser);
    }

    #[test]
    fn default_profile_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            name: Some("New".into()),
            ..ProfileUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
