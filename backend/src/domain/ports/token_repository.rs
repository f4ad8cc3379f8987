//! Port abstraction for access token persistence.

use async_trait::async_trait;

use crate::domain::auth::TokenDigest;
use crate::domain::user::UserId;

/// Persistence errors raised by token repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenPersistenceError {
    /// Repository connection could not be established.
    #[error("token repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("token repository query failed: {message}")]
    Query { message: String },
}

impl TokenPersistenceError {
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
pub trait TokenRepository: Send + Sync {
    /// Store a token digest for the given user.
    async fn insert(
        &self,
        digest: &TokenDigest,
        user_id: UserId,
    ) -> Result<(), TokenPersistenceError>;

    /// Resolve a presented token digest to its owning user, if any.
    async fn find_user(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<UserId>, TokenPersistenceError>;
}
