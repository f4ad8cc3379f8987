//! HTTP adapter mapping for domain and port errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while letting actix
//! handlers turn failures into consistent JSON responses and status codes.
//! Port error enums are folded into domain errors here so handler code reads
//! as one `?` chain.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::domain::ports::{
    ImageStoreError, LabelPersistenceError, RecipePersistenceError, TokenPersistenceError,
    UserPersistenceError,
};
use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};
use crate::middleware::trace::TraceId;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        Error::internal("Internal server error")
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = redact_if_internal(self);
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = TraceId::current() {
            builder.insert_header((TRACE_ID_HEADER, id.to_string()));
            body = body.with_trace_id(id.to_string());
        }
        builder.json(body)
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

/// Map user persistence failures onto the HTTP error taxonomy.
pub fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            error!(%message, "user repository unavailable");
            Error::service_unavailable("database unavailable")
        }
        UserPersistenceError::Query { message } => {
            error!(%message, "user repository query failed");
            Error::internal("database query failed")
        }
        UserPersistenceError::EmailTaken => {
            Error::invalid_request("user with this email already exists")
                .with_details(json!({ "field": "email", "code": "email_taken" }))
        }
    }
}

/// Map token persistence failures onto the HTTP error taxonomy.
pub fn map_token_error(error: TokenPersistenceError) -> Error {
    match error {
        TokenPersistenceError::Connection { message } => {
            error!(%message, "token repository unavailable");
            Error::service_unavailable("database unavailable")
        }
        TokenPersistenceError::Query { message } => {
            error!(%message, "token repository query failed");
            Error::internal("database query failed")
        }
    }
}

/// Map recipe persistence failures onto the HTTP error taxonomy.
pub fn map_recipe_error(error: RecipePersistenceError) -> Error {
    match error {
        RecipePersistenceError::Connection { message } => {
            error!(%message, "recipe repository unavailable");
            Error::service_unavailable("database unavailable")
        }
        RecipePersistenceError::Query { message } => {
            error!(%message, "recipe repository query failed");
            Error::internal("database query failed")
        }
    }
}

/// Map label persistence failures onto the HTTP error taxonomy.
pub fn map_label_error(error: LabelPersistenceError) -> Error {
    match error {
        LabelPersistenceError::Connection { message } => {
            error!(%message, "label repository unavailable");
            Error::service_unavailable("database unavailable")
        }
        LabelPersistenceError::Query { message } => {
            error!(%message, "label repository query failed");
            Error::internal("database query failed")
        }
        LabelPersistenceError::DuplicateName => {
            Error::invalid_request("a label with this name already exists")
                .with_details(json!({ "field": "name", "code": "duplicate_name" }))
        }
    }
}

/// Map image store failures onto the HTTP error taxonomy.
pub fn map_image_error(error: ImageStoreError) -> Error {
    match error {
        ImageStoreError::Io { message } => {
            error!(%message, "image store operation failed");
            Error::internal("image storage failed")
        }
    }
}
