//! User API handlers: registration, token issuance, and own-profile access.
//!
//! ```text
//! POST /api/user/create {"email":"a@x.com","password":"pw123","name":"Ada"}
//! POST /api/user/token  {"email":"a@x.com","password":"pw123"}
//! GET/PUT/PATCH /api/user/me
//! ```

use actix_web::{HttpResponse, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::auth::{AccessToken, PasswordHash, check_password_policy};
use crate::domain::{EmailAddress, EmailValidationError, Error, NewUser, ProfileUpdate, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::error::{map_token_error, map_user_error};
use crate::inbound::http::state::HttpState;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Token issuance request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Public representation of an account; the password never appears.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email.into(),
            name: user.name,
        }
    }
}

/// Full profile update body (`PUT /api/user/me`).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PutProfileRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Partial profile update body (`PATCH /api/user/me`).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PatchProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn map_email_error(err: EmailValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": "email", "code": "invalid_email" }))
}

fn parse_email(raw: &str) -> Result<EmailAddress, Error> {
    EmailAddress::parse(raw).map_err(map_email_error)
}

fn hash_checked_password(raw: &str) -> Result<PasswordHash, Error> {
    check_password_policy(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "password", "code": "password_too_short" }))
    })?;
    PasswordHash::hash(raw).map_err(|err| Error::internal(err.to_string()))
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/user/create",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
    ),
    tags = ["user"],
    operation_id = "createUser",
    security([])
)]
#[post("/user/create")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = parse_email(&payload.email)?;
    let password_hash = hash_checked_password(&payload.password)?;

    let user = state
        .users
        .insert(NewUser::registration(email, password_hash, payload.name))
        .await
        .map_err(map_user_error)?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Issue a bearer token for valid credentials.
#[utoipa::path(
    post,
    path = "/api/user/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
    ),
    tags = ["user"],
    operation_id = "createToken",
    security([])
)]
#[post("/user/token")]
pub async fn create_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let payload = payload.into_inner();
    let email = parse_email(&payload.email)?;

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(map_user_error)?;
    let authenticated = user
        .filter(|user| user.can_authenticate() && user.password_hash.verify(&payload.password));
    let Some(user) = authenticated else {
        return Err(Error::unauthorized(
            "unable to authenticate with provided credentials",
        ));
    };

    let token = AccessToken::generate();
    state
        .tokens
        .insert(&token.digest(), user.id)
        .await
        .map_err(map_token_error)?;

    Ok(web::Json(TokenResponse {
        token: token.as_str().to_owned(),
    }))
}

/// Retrieve the caller's own profile.
#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["user"],
    operation_id = "retrieveProfile"
)]
#[get("/user/me")]
pub async fn retrieve_profile(auth: Authenticated) -> ApiResult<web::Json<UserResponse>> {
    Ok(web::Json(UserResponse::from(auth.0)))
}

async fn apply_profile_update(
    state: &HttpState,
    auth: Authenticated,
    update: ProfileUpdate,
) -> ApiResult<web::Json<UserResponse>> {
    if update.is_empty() {
        return Ok(web::Json(UserResponse::from(auth.0)));
    }
    let user = state
        .users
        .update_profile(auth.user_id(), update)
        .await
        .map_err(map_user_error)?
        .ok_or_else(|| Error::not_found("user not found"))?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Replace the caller's profile.
#[utoipa::path(
    put,
    path = "/api/user/me",
    request_body = PutProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["user"],
    operation_id = "replaceProfile"
)]
#[put("/user/me")]
pub async fn replace_profile(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<PutProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let payload = payload.into_inner();
    let update = ProfileUpdate {
        email: Some(parse_email(&payload.email)?),
        name: Some(payload.name),
        password_hash: payload
            .password
            .as_deref()
            .map(hash_checked_password)
            .transpose()?,
    };
    apply_profile_update(&state, auth, update).await
}

/// Partially update the caller's profile.
#[utoipa::path(
    patch,
    path = "/api/user/me",
    request_body = PatchProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
    ),
    tags = ["user"],
    operation_id = "updateProfile"
)]
#[patch("/user/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<PatchProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let payload = payload.into_inner();
    let update = ProfileUpdate {
        email: payload.email.as_deref().map(parse_email).transpose()?,
        name: payload.name,
        password_hash: payload
            .password
            .as_deref()
            .map(hash_checked_password)
            .transpose()?,
    };
    apply_profile_update(&state, auth, update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{self, read_error_code, read_json};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;

    #[actix_web::test]
    async fn registration_returns_the_profile_without_the_password() {
        let app = test_utils::init_app().await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/create")
                .set_json(CreateUserRequest {
                    email: "test@EXAMPLE.com".into(),
                    password: "pw123".into(),
                    name: "Test Name".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["email"], "test@example.com");
        assert_eq!(body["name"], "Test Name");
        assert!(body.get("password").is_none());
    }

    #[rstest]
    #[case("", "pw123")]
    #[case("not-an-email", "pw123")]
    #[case("ok@example.com", "pw")]
    #[actix_web::test]
    async fn registration_rejects_bad_email_or_short_password(
        #[case] email: &str,
        #[case] password: &str,
    ) {
        let app = test_utils::init_app().await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/create")
                .set_json(CreateUserRequest {
                    email: email.into(),
                    password: password.into(),
                    name: String::new(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn duplicate_email_registration_fails() {
        let app = test_utils::init_app().await;
        test_utils::register(&app, "dup@example.com", "pw123").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/create")
                .set_json(CreateUserRequest {
                    email: "dup@example.com".into(),
                    password: "pw456".into(),
                    name: String::new(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_error_code(response).await, "invalid_request");
    }

    #[actix_web::test]
    async fn token_issuance_succeeds_for_valid_credentials() {
        let app = test_utils::init_app().await;
        test_utils::register(&app, "login@example.com", "pw123").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/token")
                .set_json(TokenRequest {
                    email: "login@example.com".into(),
                    password: "pw123".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = read_json(response).await;
        let token = body["token"].as_str().expect("token present");
        assert_eq!(token.len(), 40);
    }

    #[rstest]
    #[case("login2@example.com", "wrong-password")]
    #[case("unknown@example.com", "pw123")]
    #[actix_web::test]
    async fn token_issuance_rejects_bad_credentials(
        #[case] email: &str,
        #[case] password: &str,
    ) {
        let app = test_utils::init_app().await;
        test_utils::register(&app, "login2@example.com", "pw123").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/token")
                .set_json(TokenRequest {
                    email: email.into(),
                    password: password.into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn profile_requires_authentication() {
        let app = test_utils::init_app().await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/user/me")
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn profile_round_trips_through_token_auth() {
        let app = test_utils::init_app().await;
        let token = test_utils::register_and_login(&app, "me@example.com", "pw123").await;

        let response = actix_test::call_service(
            &app,
            test_utils::authed(actix_test::TestRequest::get().uri("/api/user/me"), &token)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["email"], "me@example.com");
    }

    #[actix_web::test]
    async fn patch_updates_name_and_password() {
        let app = test_utils::init_app().await;
        let token = test_utils::register_and_login(&app, "patch@example.com", "pw123").await;

        let response = actix_test::call_service(
            &app,
            test_utils::authed(actix_test::TestRequest::patch().uri("/api/user/me"), &token)
                .set_json(PatchProfileRequest {
                    email: None,
                    name: Some("New Name".into()),
                    password: Some("newpass".into()),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["name"], "New Name");

        // The old password no longer authenticates; the new one does.
        let old = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/token")
                .set_json(TokenRequest {
                    email: "patch@example.com".into(),
                    password: "pw123".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

        let new = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/user/token")
                .set_json(TokenRequest {
                    email: "patch@example.com".into(),
                    password: "newpass".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(new.status(), StatusCode::OK);
    }
}
