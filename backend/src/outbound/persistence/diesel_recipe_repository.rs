//! PostgreSQL-backed `RecipeRepository` using Diesel.
//!
//! Create and update run inside a single transaction: the recipe row write,
//! the clearing of stale association rows, and the get-or-create of label
//! rows commit or roll back together. Get-or-create relies on the
//! `(user_id, name)` unique constraint with `ON CONFLICT DO NOTHING`, so two
//! concurrent writers converge on one label row instead of racing a
//! look-then-insert.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{RecipePersistenceError, RecipeRepository};
use crate::domain::{
    Label, LabelId, LabelName, Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch, UserId,
};

use super::models::{NewRecipeRow, RecipeChangeset, RecipeRow};
use super::pool::{DbPool, PoolError};
use super::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};

/// Rows joining a recipe id to a label's id and name.
type LabelJoinRow = (i64, i64, String);

/// Diesel-backed implementation of the `RecipeRepository` port.
#[derive(Clone)]
pub struct DieselRecipeRepository {
    pool: DbPool,
}

impl DieselRecipeRepository {
    /// Create a repository over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RecipePersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RecipePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> RecipePersistenceError {
    debug!(error = %error, "recipe query failed");
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RecipePersistenceError::connection("database connection error")
        }
        _ => RecipePersistenceError::query("database error"),
    }
}

fn join_rows_to_labels(
    rows: Vec<LabelJoinRow>,
) -> Result<HashMap<i64, Vec<Label>>, RecipePersistenceError> {
    let mut grouped: HashMap<i64, Vec<Label>> = HashMap::new();
    for (recipe_id, label_id, name) in rows {
        let name = LabelName::new(name).map_err(|err| {
            RecipePersistenceError::query(format!("stored label name invalid: {err}"))
        })?;
        grouped.entry(recipe_id).or_default().push(Label {
            id: LabelId::new(label_id),
            name,
        });
    }
    Ok(grouped)
}

fn assemble_recipe(
    row: RecipeRow,
    tags_by_recipe: &mut HashMap<i64, Vec<Label>>,
    ingredients_by_recipe: &mut HashMap<i64, Vec<Label>>,
) -> Recipe {
    Recipe {
        id: RecipeId::new(row.id),
        title: row.title,
        description: row.description,
        time_minutes: row.time_minutes,
        price: row.price,
        link: row.link,
        image_path: row.image_path,
        tags: tags_by_recipe.remove(&row.id).unwrap_or_default(),
        ingredients: ingredients_by_recipe.remove(&row.id).unwrap_or_default(),
    }
}

async fn load_tag_joins(
    conn: &mut AsyncPgConnection,
    recipe_ids: &[i64],
) -> Result<Vec<LabelJoinRow>, DieselError> {
    recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(recipe_ids))
        .select((recipe_tags::recipe_id, tags::id, tags::name))
        .order((recipe_tags::recipe_id, tags::id))
        .load(conn)
        .await
}

async fn load_ingredient_joins(
    conn: &mut AsyncPgConnection,
    recipe_ids: &[i64],
) -> Result<Vec<LabelJoinRow>, DieselError> {
    recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids))
        .select((
            recipe_ingredients::recipe_id,
            ingredients::id,
            ingredients::name,
        ))
        .order((recipe_ingredients::recipe_id, ingredients::id))
        .load(conn)
        .await
}

/// Get-or-create each tag for the owner and link it to the recipe.
async fn link_tags(
    conn: &mut AsyncPgConnection,
    owner: i64,
    recipe_id: i64,
    names: &[LabelName],
) -> Result<(), DieselError> {
    for name in names {
        diesel::insert_into(tags::table)
            .values((tags::user_id.eq(owner), tags::name.eq(name.as_str())))
            .on_conflict((tags::user_id, tags::name))
            .do_nothing()
            .execute(conn)
            .await?;
        let tag_id: i64 = tags::table
            .filter(tags::user_id.eq(owner).and(tags::name.eq(name.as_str())))
            .select(tags::id)
            .first(conn)
            .await?;
        diesel::insert_into(recipe_tags::table)
            .values((
                recipe_tags::recipe_id.eq(recipe_id),
                recipe_tags::tag_id.eq(tag_id),
            ))
            .on_conflict_do_nothing()
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Get-or-create each ingredient for the owner and link it to the recipe.
async fn link_ingredients(
    conn: &mut AsyncPgConnection,
    owner: i64,
    recipe_id: i64,
    names: &[LabelName],
) -> Result<(), DieselError> {
    for name in names {
        diesel::insert_into(ingredients::table)
            .values((
                ingredients::user_id.eq(owner),
                ingredients::name.eq(name.as_str()),
            ))
            .on_conflict((ingredients::user_id, ingredients::name))
            .do_nothing()
            .execute(conn)
            .await?;
        let ingredient_id: i64 = ingredients::table
            .filter(
                ingredients::user_id
                    .eq(owner)
                    .and(ingredients::name.eq(name.as_str())),
            )
            .select(ingredients::id)
            .first(conn)
            .await?;
        diesel::insert_into(recipe_ingredients::table)
            .values((
                recipe_ingredients::recipe_id.eq(recipe_id),
                recipe_ingredients::ingredient_id.eq(ingredient_id),
            ))
            .on_conflict_do_nothing()
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Scalar row plus its label join rows, produced inside a transaction.
type RecipeBundle = (RecipeRow, Vec<LabelJoinRow>, Vec<LabelJoinRow>);

fn bundle_to_recipe(bundle: RecipeBundle) -> Result<Recipe, RecipePersistenceError> {
    let (row, tag_rows, ingredient_rows) = bundle;
    let mut tags_by_recipe = join_rows_to_labels(tag_rows)?;
    let mut ingredients_by_recipe = join_rows_to_labels(ingredient_rows)?;
    Ok(assemble_recipe(
        row,
        &mut tags_by_recipe,
        &mut ingredients_by_recipe,
    ))
}

#[async_trait]
impl RecipeRepository for DieselRecipeRepository {
    async fn list(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let tag_filter = filter
            .tags
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.as_i64()).collect::<Vec<_>>());
        let ingredient_filter = filter
            .ingredients
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.as_i64()).collect::<Vec<_>>());

        let result: Result<(Vec<RecipeRow>, Vec<LabelJoinRow>, Vec<LabelJoinRow>), DieselError> =
            conn.transaction(|conn| {
                async move {
                    let mut query = recipes::table
                        .filter(recipes::user_id.eq(owner.as_i64()))
                        .select(RecipeRow::as_select())
                        .into_boxed();
                    if let Some(ids) = tag_filter {
                        query = query.filter(
                            recipes::id.eq_any(
                                recipe_tags::table
                                    .filter(recipe_tags::tag_id.eq_any(ids))
                                    .select(recipe_tags::recipe_id),
                            ),
                        );
                    }
                    if let Some(ids) = ingredient_filter {
                        query = query.filter(
                            recipes::id.eq_any(
                                recipe_ingredients::table
                                    .filter(recipe_ingredients::ingredient_id.eq_any(ids))
                                    .select(recipe_ingredients::recipe_id),
                            ),
                        );
                    }
                    let rows: Vec<RecipeRow> =
                        query.order(recipes::id.desc()).load(conn).await?;
                    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
                    let tag_rows = load_tag_joins(conn, &ids).await?;
                    let ingredient_rows = load_ingredient_joins(conn, &ids).await?;
                    Ok((rows, tag_rows, ingredient_rows))
                }
                .scope_boxed()
            })
            .await;

        let (rows, tag_rows, ingredient_rows) = result.map_err(map_diesel_error)?;
        let mut tags_by_recipe = join_rows_to_labels(tag_rows)?;
        let mut ingredients_by_recipe = join_rows_to_labels(ingredient_rows)?;
        Ok(rows
            .into_iter()
            .map(|row| assemble_recipe(row, &mut tags_by_recipe, &mut ingredients_by_recipe))
            .collect())
    }

    async fn find(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let result: Result<Option<RecipeBundle>, DieselError> = conn
            .transaction(|conn| {
                async move {
                    let row: Option<RecipeRow> = recipes::table
                        .filter(
                            recipes::id
                                .eq(id.as_i64())
                                .and(recipes::user_id.eq(owner.as_i64())),
                        )
                        .select(RecipeRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    let ids = [row.id];
                    let tag_rows = load_tag_joins(conn, &ids).await?;
                    let ingredient_rows = load_ingredient_joins(conn, &ids).await?;
                    Ok(Some((row, tag_rows, ingredient_rows)))
                }
                .scope_boxed()
            })
            .await;

        result
            .map_err(map_diesel_error)?
            .map(bundle_to_recipe)
            .transpose()
    }

    async fn create(
        &self,
        owner: UserId,
        draft: RecipeDraft,
    ) -> Result<Recipe, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let result: Result<RecipeBundle, DieselError> = conn
            .transaction(|conn| {
                async move {
                    let row: RecipeRow = diesel::insert_into(recipes::table)
                        .values(&NewRecipeRow {
                            user_id: owner.as_i64(),
                            title: &draft.title,
                            description: &draft.description,
                            time_minutes: draft.time_minutes,
                            price: &draft.price,
                            link: &draft.link,
                        })
                        .returning(RecipeRow::as_returning())
                        .get_result(conn)
                        .await?;
                    link_tags(conn, owner.as_i64(), row.id, &draft.tags).await?;
                    link_ingredients(conn, owner.as_i64(), row.id, &draft.ingredients).await?;
                    let ids = [row.id];
                    let tag_rows = load_tag_joins(conn, &ids).await?;
                    let ingredient_rows = load_ingredient_joins(conn, &ids).await?;
                    Ok((row, tag_rows, ingredient_rows))
                }
                .scope_boxed()
            })
            .await;

        bundle_to_recipe(result.map_err(map_diesel_error)?)
    }

    async fn update(
        &self,
        owner: UserId,
        id: RecipeId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let result: Result<Option<RecipeBundle>, DieselError> = conn
            .transaction(|conn| {
                async move {
                    let changeset = RecipeChangeset {
                        title: patch.title,
                        description: patch.description,
                        time_minutes: patch.time_minutes,
                        price: patch.price,
                        link: patch.link,
                        updated_at: Utc::now(),
                    };
                    let row: Option<RecipeRow> = diesel::update(
                        recipes::table.filter(
                            recipes::id
                                .eq(id.as_i64())
                                .and(recipes::user_id.eq(owner.as_i64())),
                        ),
                    )
                    .set(&changeset)
                    .returning(RecipeRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some(row) = row else {
                        return Ok(None);
                    };

                    if let Some(names) = &patch.tags {
                        diesel::delete(
                            recipe_tags::table.filter(recipe_tags::recipe_id.eq(row.id)),
                        )
                        .execute(conn)
                        .await?;
                        link_tags(conn, owner.as_i64(), row.id, names).await?;
                    }
                    if let Some(names) = &patch.ingredients {
                        diesel::delete(
                            recipe_ingredients::table
                                .filter(recipe_ingredients::recipe_id.eq(row.id)),
                        )
                        .execute(conn)
                        .await?;
                        link_ingredients(conn, owner.as_i64(), row.id, names).await?;
                    }

                    let ids = [row.id];
                    let tag_rows = load_tag_joins(conn, &ids).await?;
                    let ingredient_rows = load_ingredient_joins(conn, &ids).await?;
                    Ok(Some((row, tag_rows, ingredient_rows)))
                }
                .scope_boxed()
            })
            .await;

        result
            .map_err(map_diesel_error)?
            .map(bundle_to_recipe)
            .transpose()
    }

    async fn delete(&self, owner: UserId, id: RecipeId) -> Result<bool, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            recipes::table.filter(
                recipes::id
                    .eq(id.as_i64())
                    .and(recipes::user_id.eq(owner.as_i64())),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn set_image(
        &self,
        owner: UserId,
        id: RecipeId,
        image_path: Option<&str>,
    ) -> Result<bool, RecipePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            recipes::table.filter(
                recipes::id
                    .eq(id.as_i64())
                    .and(recipes::user_id.eq(owner.as_i64())),
            ),
        )
        .set((
            recipes::image_path.eq(image_path),
            recipes::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_rows_group_by_recipe() {
        let grouped = join_rows_to_labels(vec![
            (1, 10, "Vegan".to_owned()),
            (1, 11, "Quick".to_owned()),
            (2, 10, "Vegan".to_owned()),
        ])
        .expect("valid rows");
        assert_eq!(grouped[&1].len(), 2);
        assert_eq!(grouped[&2].len(), 1);
        assert_eq!(grouped[&2][0].id, LabelId::new(10));
    }

    #[test]
    fn invalid_stored_names_surface_as_query_errors() {
        let error = join_rows_to_labels(vec![(1, 10, String::new())])
            .expect_err("blank stored name must fail");
        assert!(matches!(error, RecipePersistenceError::Query { .. }));
    }
}
