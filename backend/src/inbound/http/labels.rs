//! Shared request handling for the tag and ingredient collections.
//!
//! The two collections expose identical list/rename/delete semantics, so the
//! route modules (`tags`, `ingredients`) delegate here with their
//! [`LabelKind`] and repository.

use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::LabelRepository;
use crate::domain::{Error, Label, LabelId, LabelKind, LabelName, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::map_label_error;

/// Wire representation of a tag or ingredient.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LabelResponse {
    pub id: i64,
    pub name: String,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id.as_i64(),
            name: label.name.into(),
        }
    }
}

/// Rename request body for `PATCH .../{id}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RenameLabelRequest {
    pub name: String,
}

/// Query parameters accepted by label list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LabelListQuery {
    #[serde(default)]
    pub assigned_only: Option<String>,
}

/// Interpret the `assigned_only` flag; only `0` and `1` are accepted.
pub fn parse_assigned_only(query: &LabelListQuery) -> Result<bool, Error> {
    match query.assigned_only.as_deref() {
        None | Some("0") => Ok(false),
        Some("1") => Ok(true),
        Some(other) => Err(Error::invalid_request("assigned_only must be 0 or 1")
            .with_details(json!({ "field": "assigned_only", "value": other }))),
    }
}

fn parse_name(kind: LabelKind, raw: String) -> Result<LabelName, Error> {
    LabelName::new(raw).map_err(|err| {
        Error::invalid_request(format!("{} {err}", kind.as_str()))
            .with_details(json!({ "field": "name" }))
    })
}

fn label_not_found(kind: LabelKind) -> Error {
    Error::not_found(format!("{} not found", kind.as_str()))
}

/// List the caller's labels, optionally restricted to assigned ones.
pub async fn list(
    repo: &dyn LabelRepository,
    owner: UserId,
    query: &LabelListQuery,
) -> ApiResult<Vec<LabelResponse>> {
    let assigned_only = parse_assigned_only(query)?;
    let labels = repo
        .list(owner, assigned_only)
        .await
        .map_err(map_label_error)?;
    Ok(labels.into_iter().map(LabelResponse::from).collect())
}

/// Rename one of the caller's labels.
pub async fn rename(
    repo: &dyn LabelRepository,
    kind: LabelKind,
    owner: UserId,
    id: i64,
    request: RenameLabelRequest,
) -> ApiResult<LabelResponse> {
    let name = parse_name(kind, request.name)?;
    let label = repo
        .rename(owner, LabelId::new(id), name)
        .await
        .map_err(map_label_error)?
        .ok_or_else(|| label_not_found(kind))?;
    Ok(LabelResponse::from(label))
}

/// Delete one of the caller's labels.
pub async fn delete(
    repo: &dyn LabelRepository,
    kind: LabelKind,
    owner: UserId,
    id: i64,
) -> ApiResult<()> {
    let removed = repo
        .delete(owner, LabelId::new(id))
        .await
        .map_err(map_label_error)?;
    if removed {
        Ok(())
    } else {
        Err(label_not_found(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Ok(false))]
    #[case(Some("0"), Ok(false))]
    #[case(Some("1"), Ok(true))]
    fn assigned_only_accepts_zero_and_one(
        #[case] raw: Option<&str>,
        #[case] expected: Result<bool, ()>,
    ) {
        let query = LabelListQuery {
            assigned_only: raw.map(ToOwned::to_owned),
        };
        assert_eq!(parse_assigned_only(&query).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("2")]
    #[case("true")]
    #[case("")]
    fn assigned_only_rejects_other_values(#[case] raw: &str) {
        let query = LabelListQuery {
            assigned_only: Some(raw.to_owned()),
        };
        let err = parse_assigned_only(&query).expect_err("must reject");
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    }
}
