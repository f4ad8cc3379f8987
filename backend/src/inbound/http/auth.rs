//! Bearer token extractor for protected endpoints.
//!
//! Clients present `Authorization: Token <key>`; the extractor digests the
//! key, resolves it to a user, and rejects inactive accounts. Handlers take
//! an [`Authenticated`] parameter and never touch the header themselves.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::auth::TokenDigest;
use crate::domain::{Error, User, UserId};
use crate::inbound::http::error::{map_token_error, map_user_error};
use crate::inbound::http::state::HttpState;

/// Keyword expected in the `Authorization` header.
const SCHEME: &str = "Token";

/// The authenticated caller, resolved from the presented token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub User);

impl Authenticated {
    /// Identifier of the authenticated user.
    pub fn user_id(&self) -> UserId {
        self.0.id
    }
}

fn missing_credentials() -> Error {
    Error::unauthorized("authentication credentials were not provided")
}

fn invalid_token() -> Error {
    Error::unauthorized("invalid token")
}

/// Pull the token key out of an `Authorization` header value.
fn token_key(header_value: &str) -> Option<&str> {
    let (scheme, key) = header_value.split_once(' ')?;
    if scheme != SCHEME {
        return None;
    }
    let key = key.trim();
    if key.is_empty() { None } else { Some(key) }
}

async fn resolve(state: web::Data<HttpState>, key: String) -> Result<Authenticated, Error> {
    let digest = TokenDigest::of(&key);
    let user_id = state
        .tokens
        .find_user(&digest)
        .await
        .map_err(map_token_error)?
        .ok_or_else(invalid_token)?;
    let user = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(map_user_error)?
        .ok_or_else(invalid_token)?;
    if !user.can_authenticate() {
        return Err(Error::unauthorized("user account is inactive"));
    }
    Ok(Authenticated(user))
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let key = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(token_key)
            .map(ToOwned::to_owned);

        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state not configured"))?;
            let key = key.ok_or_else(missing_credentials)?;
            resolve(state, key).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Token abc123", Some("abc123"))]
    #[case("Token   abc123", Some("abc123"))]
    #[case("Bearer abc123", None)]
    #[case("Token ", None)]
    #[case("abc123", None)]
    #[case("", None)]
    fn header_parsing_requires_the_token_scheme(
        #[case] raw: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(token_key(raw), expected);
    }
}
