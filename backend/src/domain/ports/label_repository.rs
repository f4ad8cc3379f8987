//! Port abstraction for tag and ingredient persistence.
//!
//! Tags and ingredients share this trait; the HTTP state holds one
//! implementation per collection.

use async_trait::async_trait;

use crate::domain::label::{Label, LabelId, LabelName};
use crate::domain::user::UserId;

/// Persistence errors raised by label repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelPersistenceError {
    /// Repository connection could not be established.
    #[error("label repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("label repository query failed: {message}")]
    Query { message: String },

    /// The owner already has a label with the requested name.
    #[error("a label with this name already exists")]
    DuplicateName,
}

impl LabelPersistenceError {
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
pub trait LabelRepository: Send + Sync {
    /// List the owner's labels ordered by descending name. With
    /// `assigned_only`, restrict to labels attached to at least one recipe;
    /// each label appears once however many recipes reference it.
    async fn list(
        &self,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label>, LabelPersistenceError>;

    /// Rename one of the owner's labels.
    ///
    /// Returns `Ok(None)` when the owner has no such label; renaming onto an
    /// existing name fails with [`LabelPersistenceError::DuplicateName`].
    async fn rename(
        &self,
        owner: UserId,
        id: LabelId,
        name: LabelName,
    ) -> Result<Option<Label>, LabelPersistenceError>;

    /// Delete one of the owner's labels, detaching it from any recipes.
    /// Returns whether a row was removed.
    async fn delete(&self, owner: UserId, id: LabelId) -> Result<bool, LabelPersistenceError>;
}
