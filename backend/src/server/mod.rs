//! Server wiring: route registration and adapter construction.

pub mod config;

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::web;

use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ingredients, recipes, tags, users};
use crate::outbound::persistence::{
    DbPool, DieselLabelRepository, DieselRecipeRepository, DieselTokenRepository,
    DieselUserRepository, LabelTable,
};
use crate::outbound::storage::FsImageStore;

pub use config::{ConfigError, ServerConfig};

/// Register every `/api` endpoint.
///
/// The caller supplies `web::Data<HttpState>`; tests pass in-memory doubles
/// while `main` wires Diesel-backed adapters, so both run the identical
/// routing table.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(users::create_user)
            .service(users::create_token)
            .service(users::retrieve_profile)
            .service(users::replace_profile)
            .service(users::update_profile)
            .service(recipes::list_recipes)
            .service(recipes::create_recipe)
            .service(recipes::upload_recipe_image)
            .service(recipes::retrieve_recipe)
            .service(recipes::replace_recipe)
            .service(recipes::update_recipe)
            .service(recipes::delete_recipe)
            .service(tags::list_tags)
            .service(tags::rename_tag)
            .service(tags::delete_tag)
            .service(ingredients::list_ingredients)
            .service(ingredients::rename_ingredient)
            .service(ingredients::delete_ingredient),
    );
}

/// Build the production [`HttpState`] from a database pool and media root.
pub fn build_state(pool: DbPool, media_root: PathBuf) -> HttpState {
    HttpState {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        tokens: Arc::new(DieselTokenRepository::new(pool.clone())),
        recipes: Arc::new(DieselRecipeRepository::new(pool.clone())),
        tags: Arc::new(DieselLabelRepository::new(pool.clone(), LabelTable::Tags)),
        ingredients: Arc::new(DieselLabelRepository::new(pool, LabelTable::Ingredients)),
        images: Arc::new(FsImageStore::new(media_root)),
    }
}
