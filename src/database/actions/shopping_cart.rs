use log::debug;
use sqlx::{Pool, Postgres};

use super::require_recipe;
use crate::{
    authentication::permissions::ActionType,
    error::Error,
    jwt::SessionData,
    schema::{RecipeShort, Uuid},
    shopping_list::{CartIngredient, ShoppingList},
};

pub async fn add_to_shopping_cart(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeShort, Error> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;
    let recipe = require_recipe(recipe_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::conflict("Recipe is already in the shopping cart"));
    }

    Ok(recipe.into())
}

pub async fn remove_from_shopping_cart(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;
    require_recipe(recipe_id, pool).await?;

    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(session.user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::validation("Recipe is not in the shopping cart"));
    }

    Ok(())
}

/// Ingredient lines of every recipe in the user's cart, in cart order then line order.
pub async fn list_cart_ingredients(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredient>, Error> {
    let rows: Vec<CartIngredient> = sqlx::query_as(
        "
        SELECT ri.product_id AS product_id, p.name AS name, p.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN products p ON p.id = ri.product_id
        WHERE sc.user_id = $1
        ORDER BY sc.id, ri.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn build_shopping_list(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, Error> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;

    let lines = list_cart_ingredients(session.user_id, pool).await?;
    let line_count = lines.len();
    let list = ShoppingList::aggregate(lines);

    debug!(
        "Aggregated {line_count} cart lines into {} products for user {}",
        list.items().len(),
        session.user_id
    );

    Ok(list)
}
