//! Replacement of a recipe's tag and ingredient associations.
//!
//! Validation happens in [`validate_associations`], a pure pipeline over the requested ids and
//! the ids that actually exist. Only its output, [`ValidatedAssociations`], can be written by
//! [`replace_associations`], which callers run inside the same transaction as the recipe row.

use std::collections::HashSet;

use log::debug;
use sqlx::PgConnection;

use super::{error::Error, form::IngredientAmount};
use crate::schema::Uuid;

/// Ids known to exist at the time of validation.
#[derive(Debug, Default, Clone)]
pub struct KnownReferences {
    pub products: HashSet<Uuid>,
    pub tags: HashSet<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAssociations {
    tags: Vec<Uuid>,
    ingredients: Vec<IngredientAmount>,
}

impl ValidatedAssociations {
    pub fn tags(&self) -> &[Uuid] {
        &self.tags
    }

    pub fn ingredients(&self) -> &[IngredientAmount] {
        &self.ingredients
    }
}

fn check_products_exist(
    ingredients: &[IngredientAmount],
    known: &KnownReferences,
) -> Result<(), Error> {
    match ingredients.iter().find(|i| !known.products.contains(&i.id)) {
        Some(missing) => Err(Error::NotFound(format!(
            "Ingredient with id {} does not exist",
            missing.id
        ))),
        None => Ok(()),
    }
}

fn check_tags_exist(tags: &[Uuid], known: &KnownReferences) -> Result<(), Error> {
    match tags.iter().find(|id| !known.tags.contains(id)) {
        Some(missing) => Err(Error::NotFound(format!(
            "Tag with id {missing} does not exist"
        ))),
        None => Ok(()),
    }
}

fn check_amounts(ingredients: &[IngredientAmount]) -> Result<(), Error> {
    match ingredients.iter().find(|i| i.amount < 1) {
        Some(line) => Err(Error::Validation(format!(
            "Amount of ingredient {} must be at least 1",
            line.id
        ))),
        None => Ok(()),
    }
}

fn check_unique_products(ingredients: &[IngredientAmount]) -> Result<(), Error> {
    let mut seen = HashSet::with_capacity(ingredients.len());
    match ingredients.iter().find(|i| !seen.insert(i.id)) {
        Some(line) => Err(Error::Validation(format!(
            "Ingredient {} is listed more than once",
            line.id
        ))),
        None => Ok(()),
    }
}

fn check_not_empty(tags: &[Uuid], ingredients: &[IngredientAmount]) -> Result<(), Error> {
    if tags.is_empty() {
        return Err(Error::validation("Recipe needs at least one tag"));
    }
    if ingredients.is_empty() {
        return Err(Error::validation("Recipe needs at least one ingredient"));
    }
    Ok(())
}

/// Runs the association checks in order: products exist, tags exist, amounts are positive,
/// products are unique, neither set is empty. Repeated tag ids collapse into one.
pub fn validate_associations(
    tags: &[Uuid],
    ingredients: &[IngredientAmount],
    known: &KnownReferences,
) -> Result<ValidatedAssociations, Error> {
    check_products_exist(ingredients, known)?;
    check_tags_exist(tags, known)?;
    check_amounts(ingredients)?;
    check_unique_products(ingredients)?;
    check_not_empty(tags, ingredients)?;

    let mut seen = HashSet::with_capacity(tags.len());
    let tags = tags.iter().copied().filter(|id| seen.insert(*id)).collect();

    Ok(ValidatedAssociations {
        tags,
        ingredients: ingredients.to_vec(),
    })
}

/// Looks up which of the requested product and tag ids exist.
pub async fn resolve_references(
    tags: &[Uuid],
    ingredients: &[IngredientAmount],
    conn: &mut PgConnection,
) -> Result<KnownReferences, Error> {
    let product_ids: Vec<Uuid> = ingredients.iter().map(|i| i.id).collect();

    let products: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = ANY($1)")
        .bind(&product_ids)
        .fetch_all(&mut *conn)
        .await?;

    let tags: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(tags)
        .fetch_all(&mut *conn)
        .await?;

    Ok(KnownReferences {
        products: products.into_iter().map(|p| p.0).collect(),
        tags: tags.into_iter().map(|t| t.0).collect(),
    })
}

/// Resolves and validates the requested associations on `conn`.
pub async fn prepare_associations(
    tags: &[Uuid],
    ingredients: &[IngredientAmount],
    conn: &mut PgConnection,
) -> Result<ValidatedAssociations, Error> {
    let known = resolve_references(tags, ingredients, conn).await?;
    validate_associations(tags, ingredients, &known)
}

/// Drops every existing tag and ingredient row of the recipe and writes the new sets.
///
/// Must run on a transaction; a failure halfway leaves the caller to roll back.
pub async fn replace_associations(
    recipe_id: Uuid,
    associations: &ValidatedAssociations,
    conn: &mut PgConnection,
) -> Result<(), Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    let product_ids: Vec<Uuid> = associations.ingredients.iter().map(|i| i.id).collect();
    let amounts: Vec<i32> = associations.ingredients.iter().map(|i| i.amount).collect();

    sqlx::query(
        "
        INSERT INTO recipe_ingredients (recipe_id, product_id, amount)
        SELECT $1, product_id, amount
        FROM UNNEST($2::int[], $3::int[]) WITH ORDINALITY AS t(product_id, amount, position)
        ORDER BY position
    ",
    )
    .bind(recipe_id)
    .bind(&product_ids)
    .bind(&amounts)
    .execute(&mut *conn)
    .await?;

    sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::int[])")
        .bind(recipe_id)
        .bind(&associations.tags)
        .execute(&mut *conn)
        .await?;

    debug!(
        "Replaced associations of recipe {recipe_id}: {} tags, {} ingredients",
        associations.tags.len(),
        associations.ingredients.len()
    );

    Ok(())
}
