//! Port abstraction for recipe persistence.
//!
//! The adapter owns the get-or-create reconciliation of nested label lists:
//! `create` and `update` receive label *names* and must attach existing
//! `(owner, name)` labels or create missing ones, atomically with the recipe
//! write itself. All operations are owner-scoped; a foreign recipe id behaves
//! exactly like a missing one.

use async_trait::async_trait;

use crate::domain::recipe::{Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch};
use crate::domain::user::UserId;

/// Persistence errors raised by recipe repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipePersistenceError {
    /// Repository connection could not be established.
    #[error("recipe repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("recipe repository query failed: {message}")]
    Query { message: String },
}

impl RecipePersistenceError {
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
pub trait RecipeRepository: Send + Sync {
    /// List the owner's recipes, newest first, optionally filtered to those
    /// carrying at least one of the given tag/ingredient ids. Each recipe
    /// appears once regardless of how many filter ids it matches.
    async fn list(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipePersistenceError>;

    /// Fetch one of the owner's recipes by id.
    async fn find(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Insert a recipe and attach its labels via get-or-create.
    async fn create(
        &self,
        owner: UserId,
        draft: RecipeDraft,
    ) -> Result<Recipe, RecipePersistenceError>;

    /// Apply a patch. Present label lists replace the association set in
    /// full (an empty list clears it); absent lists leave it untouched.
    ///
    /// Returns `Ok(None)` when the owner has no such recipe.
    async fn update(
        &self,
        owner: UserId,
        id: RecipeId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>, RecipePersistenceError>;

    /// Delete one of the owner's recipes. Returns whether a row was removed.
    async fn delete(&self, owner: UserId, id: RecipeId) -> Result<bool, RecipePersistenceError>;

    /// Point the recipe's image at a new stored file (or clear it).
    /// Returns whether the owner's recipe existed.
    async fn set_image(
        &self,
        owner: UserId,
        id: RecipeId,
        image_path: Option<&str>,
    ) -> Result<bool, RecipePersistenceError>;
}
