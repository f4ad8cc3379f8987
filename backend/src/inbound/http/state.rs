//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ImageStore, LabelRepository, RecipeRepository, TokenRepository, UserRepository,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub tags: Arc<dyn LabelRepository>,
    pub ingredients: Arc<dyn LabelRepository>,
    pub images: Arc<dyn ImageStore>,
}
