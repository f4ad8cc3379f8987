//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{auth_tokens, recipes, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Changeset struct for profile updates.
///
/// `updated_at` is always present, so the changeset is never empty even when
/// only association-side state changed.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for issued token digests.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_tokens)]
pub(crate) struct NewTokenRow<'a> {
    pub token_digest: &'a [u8],
    pub user_id: i64,
}

/// Row struct for reading recipe scalar columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipeRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: BigDecimal,
    pub link: String,
    pub image_path: Option<String>,
}

/// Insertable struct for creating new recipe records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recipes)]
pub(crate) struct NewRecipeRow<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub description: &'a str,
    pub time_minutes: i32,
    pub price: &'a BigDecimal,
    pub link: &'a str,
}

/// Changeset struct for recipe scalar updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = recipes)]
pub(crate) struct RecipeChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<BigDecimal>,
    pub link: Option<String>,
    pub updated_at: DateTime<Utc>,
}
