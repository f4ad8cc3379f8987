//! PostgreSQL-backed `TokenRepository` using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::auth::TokenDigest;
use crate::domain::ports::{TokenPersistenceError, TokenRepository};
use crate::domain::UserId;

use super::models::NewTokenRow;
use super::pool::{DbPool, PoolError};
use super::schema::auth_tokens;

/// Diesel-backed implementation of the `TokenRepository` port.
#[derive(Clone)]
pub struct DieselTokenRepository {
    pool: DbPool,
}

impl DieselTokenRepository {
    /// Create a repository over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TokenPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            TokenPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> TokenPersistenceError {
    debug!(error = %error, "token query failed");
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            TokenPersistenceError::connection("database connection error")
        }
        _ => TokenPersistenceError::query("database error"),
    }
}

#[async_trait]
impl TokenRepository for DieselTokenRepository {
    async fn insert(
        &self,
        digest: &TokenDigest,
        user_id: UserId,
    ) -> Result<(), TokenPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(auth_tokens::table)
            .values(&NewTokenRow {
                token_digest: digest.as_bytes(),
                user_id: user_id.as_i64(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_user(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<UserId>, TokenPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_id: Option<i64> = auth_tokens::table
            .filter(auth_tokens::token_digest.eq(digest.as_bytes()))
            .select(auth_tokens::user_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(user_id.map(UserId::new))
    }
}
