//! PostgreSQL-backed `LabelRepository` covering both label tables.
//!
//! The tag and ingredient tables are structurally identical, so one adapter
//! serves both; [`LabelTable`] selects which table a given instance queries.
//! Diesel's table DSL types are distinct per table, hence the matched arms
//! rather than generics.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{LabelPersistenceError, LabelRepository};
use crate::domain::{Label, LabelId, LabelName, UserId};

use super::pool::{DbPool, PoolError};
use super::schema::{ingredients, recipe_ingredients, recipe_tags, tags};

/// Which label table an adapter instance operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTable {
    Tags,
    Ingredients,
}

/// Diesel-backed implementation of the `LabelRepository` port.
#[derive(Clone)]
pub struct DieselLabelRepository {
    pool: DbPool,
    table: LabelTable,
}

impl DieselLabelRepository {
    /// Create a repository over the given pool and label table.
    pub fn new(pool: DbPool, table: LabelTable) -> Self {
        Self { pool, table }
    }
}

fn map_pool_error(error: PoolError) -> LabelPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            LabelPersistenceError::connection(message)
        }
    }
}

/// Map Diesel failures; unique violations mean the `(user_id, name)` pair is
/// already taken.
fn map_diesel_error(error: DieselError) -> LabelPersistenceError {
    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            return LabelPersistenceError::DuplicateName;
        }
        other => debug!(error = %other, "label query failed"),
    }
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            LabelPersistenceError::connection("database connection error")
        }
        _ => LabelPersistenceError::query("database error"),
    }
}

fn rows_to_labels(rows: Vec<(i64, String)>) -> Result<Vec<Label>, LabelPersistenceError> {
    rows.into_iter()
        .map(|(id, name)| {
            let name = LabelName::new(name).map_err(|err| {
                LabelPersistenceError::query(format!("stored label name invalid: {err}"))
            })?;
            Ok(Label {
                id: LabelId::new(id),
                name,
            })
        })
        .collect()
}

#[async_trait]
impl LabelRepository for DieselLabelRepository {
    async fn list(
        &self,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label>, LabelPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(i64, String)> = match self.table {
            LabelTable::Tags => {
                let mut query = tags::table
                    .filter(tags::user_id.eq(owner.as_i64()))
                    .select((tags::id, tags::name))
                    .into_boxed();
                if assigned_only {
                    query = query
                        .filter(tags::id.eq_any(recipe_tags::table.select(recipe_tags::tag_id)));
                }
                query
                    .order(tags::name.desc())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?
            }
            LabelTable::Ingredients => {
                let mut query = ingredients::table
                    .filter(ingredients::user_id.eq(owner.as_i64()))
                    .select((ingredients::id, ingredients::name))
                    .into_boxed();
                if assigned_only {
                    query = query.filter(ingredients::id.eq_any(
                        recipe_ingredients::table.select(recipe_ingredients::ingredient_id),
                    ));
                }
                query
                    .order(ingredients::name.desc())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?
            }
        };
        rows_to_labels(rows)
    }

    async fn rename(
        &self,
        owner: UserId,
        id: LabelId,
        name: LabelName,
    ) -> Result<Option<Label>, LabelPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(i64, String)> = match self.table {
            LabelTable::Tags => diesel::update(
                tags::table.filter(tags::id.eq(id.as_i64()).and(tags::user_id.eq(owner.as_i64()))),
            )
            .set(tags::name.eq(name.as_str()))
            .returning((tags::id, tags::name))
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?,
            LabelTable::Ingredients => diesel::update(
                ingredients::table.filter(
                    ingredients::id
                        .eq(id.as_i64())
                        .and(ingredients::user_id.eq(owner.as_i64())),
                ),
            )
            .set(ingredients::name.eq(name.as_str()))
            .returning((ingredients::id, ingredients::name))
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?,
        };
        row.map(|row| rows_to_labels(vec![row]).map(|mut labels| labels.remove(0)))
            .transpose()
    }

    async fn delete(&self, owner: UserId, id: LabelId) -> Result<bool, LabelPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = match self.table {
            LabelTable::Tags => diesel::delete(
                tags::table.filter(tags::id.eq(id.as_i64()).and(tags::user_id.eq(owner.as_i64()))),
            )
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?,
            LabelTable::Ingredients => diesel::delete(
                ingredients::table.filter(
                    ingredients::id
                        .eq(id.as_i64())
                        .and(ingredients::user_id.eq(owner.as_i64())),
                ),
            )
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?,
        };
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_surface_as_duplicate_name() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(map_diesel_error(error), LabelPersistenceError::DuplicateName);
    }

    #[test]
    fn stored_rows_convert_to_labels() {
        let labels = rows_to_labels(vec![(1, "Vegan".to_owned()), (2, "Quick".to_owned())])
            .expect("valid rows");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].to_string(), "Vegan");
    }
}
