//! Tag collection endpoints.
//!
//! ```text
//! GET /api/recipe/tags?assigned_only=1
//! PATCH /api/recipe/tags/{id}
//! DELETE /api/recipe/tags/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, web};

use crate::domain::{Error, LabelKind};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::labels::{self, LabelListQuery, LabelResponse, RenameLabelRequest};
use crate::inbound::http::state::HttpState;

/// List the caller's tags, descending by name.
#[utoipa::path(
    get,
    path = "/api/recipe/tags",
    params(("assigned_only" = Option<String>, Query, description = "1 restricts to tags attached to at least one recipe")),
    responses(
        (status = 200, description = "Tags", body = [LabelResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["tags"],
    operation_id = "listTags"
)]
#[get("/recipe/tags")]
pub async fn list_tags(
    state: web::Data<HttpState>,
    auth: Authenticated,
    query: web::Query<LabelListQuery>,
) -> ApiResult<web::Json<Vec<LabelResponse>>> {
    let tags = labels::list(state.tags.as_ref(), auth.user_id(), &query).await?;
    Ok(web::Json(tags))
}

/// Rename one of the caller's tags.
#[utoipa::path(
    patch,
    path = "/api/recipe/tags/{id}",
    request_body = RenameLabelRequest,
    responses(
        (status = 200, description = "Updated tag", body = LabelResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["tags"],
    operation_id = "renameTag"
)]
#[patch("/recipe/tags/{id}")]
pub async fn rename_tag(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
    payload: web::Json<RenameLabelRequest>,
) -> ApiResult<web::Json<LabelResponse>> {
    let tag = labels::rename(
        state.tags.as_ref(),
        LabelKind::Tag,
        auth.user_id(),
        path.into_inner(),
        payload.into_inner(),
    )
    .await?;
    Ok(web::Json(tag))
}

/// Delete one of the caller's tags.
#[utoipa::path(
    delete,
    path = "/api/recipe/tags/{id}",
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
    ),
    tags = ["tags"],
    operation_id = "deleteTag"
)]
#[delete("/recipe/tags/{id}")]
pub async fn delete_tag(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    labels::delete(
        state.tags.as_ref(),
        LabelKind::Tag,
        auth.user_id(),
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}
