use sqlx::{Pool, Postgres};

use super::require_recipe;
use crate::{
    authentication::permissions::ActionType,
    error::Error,
    jwt::SessionData,
    schema::{RecipeShort, Uuid},
};

pub async fn add_to_favorites(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeShort, Error> {
    session.authenticate(ActionType::ManageOwnFavorites)?;
    let recipe = require_recipe(recipe_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::conflict("Recipe is already in favorites"));
    }

    Ok(recipe.into())
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnFavorites)?;
    require_recipe(recipe_id, pool).await?;

    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(session.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::validation("Recipe is not in favorites"));
    }

    Ok(())
}
