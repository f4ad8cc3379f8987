//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every endpoint and schema for Swagger UI (served in
//! debug builds) and any external tooling consuming the generated document.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain;
use crate::inbound::http::{health, ingredients, labels, recipes, tags, users};

/// Registers the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "TokenAuth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Bearer token issued by POST /api/user/token, presented as `Token <key>`.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    paths(
        users::create_user,
        users::create_token,
        users::retrieve_profile,
        users::replace_profile,
        users::update_profile,
        recipes::list_recipes,
        recipes::create_recipe,
        recipes::retrieve_recipe,
        recipes::replace_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::upload_recipe_image,
        tags::list_tags,
        tags::rename_tag,
        tags::delete_tag,
        ingredients::list_ingredients,
        ingredients::rename_ingredient,
        ingredients::delete_ingredient,
        health::ready,
        health::live,
    ),
    components(schemas(
        domain::Error,
        domain::ErrorCode,
        users::CreateUserRequest,
        users::TokenRequest,
        users::TokenResponse,
        users::UserResponse,
        users::PutProfileRequest,
        users::PatchProfileRequest,
        labels::LabelResponse,
        labels::RenameLabelRequest,
        recipes::PriceInput,
        recipes::LabelNameInput,
        recipes::WriteRecipeRequest,
        recipes::PatchRecipeRequest,
        recipes::RecipeSummaryResponse,
        recipes::RecipeDetailResponse,
        recipes::RecipeImageResponse,
    )),
    modifiers(&SecurityAddon),
    security(("TokenAuth" = [])),
    tags(
        (name = "user", description = "Registration, token issuance, own profile"),
        (name = "recipes", description = "Owner-scoped recipe management"),
        (name = "tags", description = "Owner-scoped tag labels"),
        (name = "ingredients", description = "Owner-scoped ingredient labels"),
        (name = "health", description = "Probes"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_includes_all_endpoint_groups() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|path| path.starts_with("/api/user")));
        assert!(
            paths
                .iter()
                .any(|path| path.starts_with("/api/recipe/recipes"))
        );
        assert!(paths.iter().any(|path| path.starts_with("/api/recipe/tags")));
        assert!(
            paths
                .iter()
                .any(|path| path.starts_with("/api/recipe/ingredients"))
        );
        assert!(paths.iter().any(|path| path.starts_with("/health")));
    }
}
