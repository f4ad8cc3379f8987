//! Recipe collection endpoints.
//!
//! ```text
//! GET /api/recipe/recipes?tags=1,2&ingredients=3
//! POST /api/recipe/recipes
//! GET/PUT/PATCH/DELETE /api/recipe/recipes/{id}
//! POST /api/recipe/recipes/{id}/upload-image
//! ```
//!
//! List responses omit `description` and `image`; the detail response carries
//! both. Nested `tags`/`ingredients` lists on write are reconciled via
//! get-or-create against the caller's own labels.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Error, LabelId, LabelName, Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch,
    RecipeValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::error::{map_image_error, map_recipe_error};
use crate::inbound::http::labels::LabelResponse;
use crate::inbound::http::state::HttpState;

/// Price field accepted as either a JSON string or number.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    #[schema(value_type = f64)]
    Number(serde_json::Number),
}

impl PriceInput {
    fn parse(&self) -> Result<BigDecimal, Error> {
        let raw = match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        };
        BigDecimal::from_str(&raw).map_err(|_| {
            Error::invalid_request("price must be a decimal number")
                .with_details(json!({ "field": "price", "value": raw }))
        })
    }
}

/// Nested label item on recipe write payloads; ids are never accepted.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LabelNameInput {
    pub name: String,
}

/// Creation payload (also used for `PUT`, which shares its required fields).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WriteRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: PriceInput,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<LabelNameInput>>,
    #[serde(default)]
    pub ingredients: Option<Vec<LabelNameInput>>,
}

/// Partial update payload for `PATCH`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PatchRecipeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub time_minutes: Option<i32>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<LabelNameInput>>,
    #[serde(default)]
    pub ingredients: Option<Vec<LabelNameInput>>,
}

/// List item: scalar summary plus label associations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeSummaryResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub tags: Vec<LabelResponse>,
    pub ingredients: Vec<LabelResponse>,
}

/// Detail view: the summary plus description and image reference.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<LabelResponse>,
    pub ingredients: Vec<LabelResponse>,
}

/// Image upload result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

fn format_price(price: &BigDecimal) -> String {
    price.with_scale(2).to_string()
}

impl From<Recipe> for RecipeSummaryResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id.as_i64(),
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: format_price(&recipe.price),
            link: recipe.link,
            tags: recipe.tags.into_iter().map(LabelResponse::from).collect(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(LabelResponse::from)
                .collect(),
        }
    }
}

impl From<Recipe> for RecipeDetailResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id.as_i64(),
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: format_price(&recipe.price),
            link: recipe.link,
            description: recipe.description,
            image: recipe.image_path,
            tags: recipe.tags.into_iter().map(LabelResponse::from).collect(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(LabelResponse::from)
                .collect(),
        }
    }
}

/// Query parameters accepted by the recipe list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
}

/// Parse a comma-separated id list; an absent or empty parameter is no filter.
fn parse_id_list(field: &str, raw: Option<&str>) -> Result<Option<Vec<LabelId>>, Error> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let mut ids = Vec::new();
    for part in raw.split(',') {
        let id = part.trim().parse::<i64>().map_err(|_| {
            Error::invalid_request(format!("{field} must be a comma-separated list of ids"))
                .with_details(json!({ "field": field, "value": part }))
        })?;
        ids.push(LabelId::new(id));
    }
    Ok(Some(ids))
}

fn map_validation_error(err: RecipeValidationError) -> Error {
    let field = match err {
        RecipeValidationError::EmptyTitle | RecipeValidationError::TitleTooLong { .. } => "title",
        RecipeValidationError::NegativePrice | RecipeValidationError::PriceOutOfRange => "price",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

fn parse_label_names(
    field: &str,
    items: Option<Vec<LabelNameInput>>,
) -> Result<Option<Vec<LabelName>>, Error> {
    let Some(items) = items else {
        return Ok(None);
    };
    let mut names = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let name = LabelName::new(item.name).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": field, "index": index }))
        })?;
        names.push(name);
    }
    Ok(Some(names))
}

fn recipe_not_found() -> Error {
    Error::not_found("recipe not found")
}

/// List the caller's recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/recipe/recipes",
    params(
        ("tags" = Option<String>, Query, description = "Comma-separated tag ids; matching recipes carry at least one"),
        ("ingredients" = Option<String>, Query, description = "Comma-separated ingredient ids; matching recipes carry at least one"),
    ),
    responses(
        (status = 200, description = "Recipes", body = [RecipeSummaryResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "listRecipes"
)]
#[get("/recipe/recipes")]
pub async fn list_recipes(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<RecipeListQuery>,
) -> ApiResult<web::Json<Vec<RecipeSummaryResponse>>> {
    let filter = RecipeFilter {
        tags: parse_id_list("tags", query.tags.as_deref())?,
        ingredients: parse_id_list("ingredients", query.ingredients.as_deref())?,
    };
    let recipes = state
        .recipes
        .list(auth.user_id(), &filter)
        .await
        .map_err(map_recipe_error)?;
    Ok(web::Json(
        recipes.into_iter().map(RecipeSummaryResponse::from).collect(),
    ))
}

/// Create a recipe, reconciling nested labels.
#[utoipa::path(
    post,
    path = "/api/recipe/recipes",
    request_body = WriteRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeDetailResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "createRecipe"
)]
#[post("/recipe/recipes")]
pub async fn create_recipe(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<WriteRecipeRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let draft = RecipeDraft::new(
        payload.title,
        payload.description.unwrap_or_default(),
        payload.time_minutes,
        payload.price.parse()?,
        payload.link.unwrap_or_default(),
        parse_label_names("tags", payload.tags)?.unwrap_or_default(),
        parse_label_names("ingredients", payload.ingredients)?.unwrap_or_default(),
    )
    .map_err(map_validation_error)?;

    let recipe = state
        .recipes
        .create(auth.user_id(), draft)
        .await
        .map_err(map_recipe_error)?;
    Ok(HttpResponse::Created().json(RecipeDetailResponse::from(recipe)))
}

/// Retrieve one of the caller's recipes.
#[utoipa::path(
    get,
    path = "/api/recipe/recipes/{id}",
    responses(
        (status = 200, description = "Recipe", body = RecipeDetailResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "retrieveRecipe"
)]
#[get("/recipe/recipes/{id}")]
pub async fn retrieve_recipe(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    let recipe = state
        .recipes
        .find(auth.user_id(), RecipeId::new(path.into_inner()))
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;
    Ok(web::Json(RecipeDetailResponse::from(recipe)))
}

async fn apply_patch(
    state: &HttpState,
    auth: &Authenticated,
    id: i64,
    patch: RecipePatch,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    patch.validate().map_err(map_validation_error)?;
    let recipe = state
        .recipes
        .update(auth.user_id(), RecipeId::new(id), patch)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;
    Ok(web::Json(RecipeDetailResponse::from(recipe)))
}

/// Replace one of the caller's recipes.
#[utoipa::path(
    put,
    path = "/api/recipe/recipes/{id}",
    request_body = WriteRecipeRequest,
    responses(
        (status = 200, description = "Updated recipe", body = RecipeDetailResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "replaceRecipe"
)]
#[put("/recipe/recipes/{id}")]
pub async fn replace_recipe(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<WriteRecipeRequest>,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    let payload = payload.into_inner();
    let patch = RecipePatch {
        title: Some(payload.title),
        time_minutes: Some(payload.time_minutes),
        price: Some(payload.price.parse()?),
        description: payload.description,
        link: payload.link,
        tags: parse_label_names("tags", payload.tags)?,
        ingredients: parse_label_names("ingredients", payload.ingredients)?,
    };
    apply_patch(&state, &auth, path.into_inner(), patch).await
}

/// Partially update one of the caller's recipes.
#[utoipa::path(
    patch,
    path = "/api/recipe/recipes/{id}",
    request_body = PatchRecipeRequest,
    responses(
        (status = 200, description = "Updated recipe", body = RecipeDetailResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "updateRecipe"
)]
#[patch("/recipe/recipes/{id}")]
pub async fn update_recipe(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<PatchRecipeRequest>,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    let payload = payload.into_inner();
    let patch = RecipePatch {
        title: payload.title,
        time_minutes: payload.time_minutes,
        price: payload.price.as_ref().map(PriceInput::parse).transpose()?,
        description: payload.description,
        link: payload.link,
        tags: parse_label_names("tags", payload.tags)?,
        ingredients: parse_label_names("ingredients", payload.ingredients)?,
    };
    apply_patch(&state, &auth, path.into_inner(), patch).await
}

/// Delete one of the caller's recipes and its stored image, if any.
#[utoipa::path(
    delete,
    path = "/api/recipe/recipes/{id}",
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "deleteRecipe"
)]
#[delete("/recipe/recipes/{id}")]
pub async fn delete_recipe(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = RecipeId::new(path.into_inner());
    let recipe = state
        .recipes
        .find(auth.user_id(), id)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?;

    let removed = state
        .recipes
        .delete(auth.user_id(), id)
        .await
        .map_err(map_recipe_error)?;
    if !removed {
        return Err(recipe_not_found());
    }
    if let Some(image_path) = recipe.image_path {
        state
            .images
            .remove(&image_path)
            .await
            .map_err(map_image_error)?;
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Attach an image to one of the caller's recipes.
///
/// The body is the raw image file; the format is detected from its magic
/// bytes, and anything unrecognisable is rejected without touching the
/// record.
#[utoipa::path(
    post,
    path = "/api/recipe/recipes/{id}/upload-image",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Not a valid image", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["recipes"],
    operation_id = "uploadRecipeImage"
)]
#[post("/recipe/recipes/{id}/upload-image")]
pub async fn upload_recipe_image(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    body: web::Bytes,
) -> ApiResult<web::Json<RecipeImageResponse>> {
    let id = RecipeId::new(path.into_inner());

    let format = image::guess_format(&body).map_err(|_| {
        Error::invalid_request("uploaded payload is not a recognised image")
            .with_details(json!({ "field": "image" }))
    })?;
    let extension = format
        .extensions_str()
        .first()
        .copied()
        .unwrap_or("bin");

    let previous = state
        .recipes
        .find(auth.user_id(), id)
        .await
        .map_err(map_recipe_error)?
        .ok_or_else(recipe_not_found)?
        .image_path;

    let stored_path = state
        .images
        .save(body.to_vec(), extension)
        .await
        .map_err(map_image_error)?;

    let attached = state
        .recipes
        .set_image(auth.user_id(), id, Some(&stored_path))
        .await
        .map_err(map_recipe_error)?;
    if !attached {
        // The recipe vanished between the lookup and the write; do not leak
        // the orphaned file.
        state
            .images
            .remove(&stored_path)
            .await
            .map_err(map_image_error)?;
        return Err(recipe_not_found());
    }

    if let Some(previous) = previous {
        state
            .images
            .remove(&previous)
            .await
            .map_err(map_image_error)?;
    }

    Ok(web::Json(RecipeImageResponse {
        id: id.as_i64(),
        image: Some(stored_path),
    }))
}

#[cfg(test)]
mod tests;
