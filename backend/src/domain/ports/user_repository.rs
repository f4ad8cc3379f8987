//! Port abstraction for user account persistence.

use async_trait::async_trait;

use crate::domain::email::EmailAddress;
use crate::domain::user::{NewUser, ProfileUpdate, User, UserId};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },

    /// The email address is already registered.
    #[error("email address is already in use")]
    EmailTaken,
}

impl UserPersistenceError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and return the stored record.
    async fn insert(&self, new_user: NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a user by normalized email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Apply a profile update, returning the refreshed record.
    ///
    /// Returns `Ok(None)` when the user no longer exists.
    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<User>, UserPersistenceError>;
}
