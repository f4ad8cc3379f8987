//! Ingredient collection endpoints; same shape as the tag collection.

use actix_web::{HttpResponse, delete, get, patch, web};

use crate::domain::{Error, LabelKind};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::labels::{self, LabelListQuery, LabelResponse, RenameLabelRequest};
use crate::inbound::http::state::HttpState;

/// List the caller's ingredients, descending by name.
#[utoipa::path(
    get,
    path = "/api/recipe/ingredients",
    params(("assigned_only" = Option<String>, Query, description = "1 restricts to ingredients attached to at least one recipe")),
    responses(
        (status = 200, description = "Ingredients", body = [LabelResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["ingredients"],
    operation_id = "listIngredients"
)]
#[get("/recipe/ingredients")]
pub async fn list_ingredients(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<LabelListQuery>,
) -> ApiResult<web::Json<Vec<LabelResponse>>> {
    let ingredients = labels::list(state.ingredients.as_ref(), auth.user_id(), &query).await?;
    Ok(web::Json(ingredients))
}

/// Rename one of the caller's ingredients.
#[utoipa::path(
    patch,
    path = "/api/recipe/ingredients/{id}",
    request_body = RenameLabelRequest,
    responses(
        (status = 200, description = "Updated ingredient", body = LabelResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["ingredients"],
    operation_id = "renameIngredient"
)]
#[patch("/recipe/ingredients/{id}")]
pub async fn rename_ingredient(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<RenameLabelRequest>,
) -> ApiResult<web::Json<LabelResponse>> {
    let ingredient = labels::rename(
        state.ingredients.as_ref(),
        LabelKind::Ingredient,
        auth.user_id(),
        path.into_inner(),
        payload.into_inner(),
    )
    .await?;
    Ok(web::Json(ingredient))
}

/// Delete one of the caller's ingredients.
#[utoipa::path(
    delete,
    path = "/api/recipe/ingredients/{id}",
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["ingredients"],
    operation_id = "deleteIngredient"
)]
#[delete("/recipe/ingredients/{id}")]
pub async fn delete_ingredient(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    labels::delete(
        state.ingredients.as_ref(),
        LabelKind::Ingredient,
        auth.user_id(),
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::inbound::http::test_utils::{self, read_json};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn assigned_only_returns_each_ingredient_once() {
        let app = test_utils::init_app().await;
        let token = test_utils::register_and_login(&app, "pantry@example.com", "pw123").await;

        // "Salt" is used by both recipes; it must still appear exactly once.
        test_utils::create_recipe(
            &app,
            &token,
            json!({ "title": "Soup", "time_minutes": 25, "price": "4.50",
                    "ingredients": [{ "name": "Salt" }, { "name": "Leek" }] }),
        )
        .await;
        test_utils::create_recipe(
            &app,
            &token,
            json!({ "title": "Bread", "time_minutes": 90, "price": "2.50",
                    "ingredients": [{ "name": "Salt" }] }),
        )
        .await;

        let response = actix_test::call_service(
            &app,
            test_utils::authed(
                actix_test::TestRequest::get().uri("/api/recipe/ingredients?assigned_only=1"),
                &token,
            )
            .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        let names: Vec<&str> = body
            .as_array()
            .expect("array body")
            .iter()
            .map(|item| item["name"].as_str().expect("name"))
            .collect();
        assert_eq!(names, vec!["Salt", "Leek"]);
    }

    #[actix_web::test]
    async fn foreign_ingredients_are_invisible() {
        let app = test_utils::init_app().await;
        let owner = test_utils::register_and_login(&app, "cook@example.com", "pw123").await;
        let intruder = test_utils::register_and_login(&app, "rival@example.com", "pw123").await;

        test_utils::create_recipe(
            &app,
            &owner,
            json!({ "title": "Cake", "time_minutes": 60, "price": "8.00",
                    "ingredients": [{ "name": "Flour" }] }),
        )
        .await;
        let ingredients = test_utils::fetch_json(&app, &owner, "/api/recipe/ingredients").await;
        let id = ingredients.as_array().expect("array")[0]["id"]
            .as_i64()
            .expect("id");

        let listed = test_utils::fetch_json(&app, &intruder, "/api/recipe/ingredients").await;
        assert!(listed.as_array().expect("array").is_empty());

        let delete = actix_test::call_service(
            &app,
            test_utils::authed(
                actix_test::TestRequest::delete().uri(&format!("/api/recipe/ingredients/{id}")),
                &intruder,
            )
            .to_request(),
        )
        .await;
        assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    }
}
