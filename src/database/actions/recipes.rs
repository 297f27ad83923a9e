use log::{debug, info};
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{get_user_view, list_recipe_tags};
use crate::{
    associations::{prepare_associations, replace_associations},
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::Error,
    form::{RecipeFilter, RecipeForm},
    jwt::SessionData,
    pagination::{Page, PageContext},
    schema::{IngredientLine, Recipe, RecipeRow, RecipeShort, RecipeView, Uuid},
};

/// Recipe columns plus the viewer-relative flags and the total row count.
fn recipe_select(viewer: Option<Uuid>) -> QueryBuilder<'static, Postgres> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, \
         EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_favorited, \
         EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ",
    );
    query.push_bind(viewer);
    query.push(") AS is_in_shopping_cart, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    query
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeView>, Error> {
    if viewer.is_none() && (filter.is_favorited.is_some() || filter.is_in_shopping_cart.is_some()) {
        return Err(Error::unauthorized(
            "Log in to filter by favorites or shopping cart",
        ));
    }
    let page = Page::from_query(filter.page, RECIPE_COUNT_PER_PAGE);

    let mut query = recipe_select(viewer);

    if !filter.tags.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND t.slug = ANY(",
        );
        query.push_bind(filter.tags.to_owned());
        query.push("))");
    }

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ");
        query.push_bind(author);
    }

    if let Some(is_favorited) = filter.is_favorited {
        query.push(if is_favorited { " AND EXISTS" } else { " AND NOT EXISTS" });
        query.push(" (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ");
        query.push_bind(viewer);
        query.push(")");
    }

    if let Some(is_in_shopping_cart) = filter.is_in_shopping_cart {
        query.push(if is_in_shopping_cart { " AND EXISTS" } else { " AND NOT EXISTS" });
        query.push(" (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ");
        query.push_bind(viewer);
        query.push(")");
    }

    query.push(" ORDER BY r.id DESC LIMIT ");
    query.push_bind(page.size);
    query.push(" OFFSET ");
    query.push_bind(page.offset());

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;
    let total_count = rows.first().map(|r| r.count).unwrap_or(0);

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(build_recipe_view(row, viewer, pool).await?);
    }

    PageContext::from_rows(views, total_count, page)
}

pub async fn list_recipe_ingredients(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<IngredientLine>, Error> {
    let rows: Vec<IngredientLine> = sqlx::query_as(
        "
        SELECT p.id AS id, p.name AS name, p.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN products p ON p.id = ri.product_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn build_recipe_view(
    row: RecipeRow,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, Error> {
    let recipe = row.recipe;

    let tags = list_recipe_tags(pool, recipe.id).await?;
    let ingredients = list_recipe_ingredients(pool, recipe.id).await?;
    let author = get_user_view(pool, recipe.author_id, viewer).await?;

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited: row.is_favorited,
        is_in_shopping_cart: row.is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn require_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Recipe, Error> {
    get_recipe(id, pool)
        .await?
        .ok_or_else(|| Error::not_found("No recipe exists with specified id"))
}

pub async fn get_recipe_view(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, Error> {
    let mut query = recipe_select(viewer);
    query.push(" AND r.id = ");
    query.push_bind(id);

    let row: Option<RecipeRow> = query.build_query_as().fetch_optional(pool).await?;

    match row {
        Some(row) => build_recipe_view(row, viewer, pool).await,
        None => Err(Error::not_found("No recipe exists with specified id")),
    }
}

pub async fn list_author_recipes(
    author_id: Uuid,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeShort>, Error> {
    let rows: Vec<RecipeShort> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit.map(|l| l.max(0)))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Creates the recipe row and its associations in one transaction.
pub async fn create_recipe(
    form: &RecipeForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    let fields = form.validate_fields()?;

    let mut tx = pool.begin().await?;

    let associations = prepare_associations(&form.tags, &form.ingredients, &mut tx).await?;

    let recipe: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&fields.name)
    .bind(&fields.image)
    .bind(&fields.text)
    .bind(fields.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    let recipe_id = recipe.0;
    replace_associations(recipe_id, &associations, &mut tx).await?;

    tx.commit().await?;
    info!("User {} created recipe {recipe_id}", session.user_id);

    get_recipe_view(recipe_id, Some(session.user_id), pool).await
}

/// Rewrites the recipe fields and swaps its associations. Nothing is kept if any step fails.
pub async fn update_recipe(
    id: Uuid,
    form: &RecipeForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, Error> {
    let fields = form.validate_fields()?;

    let mut tx = pool.begin().await?;

    let recipe: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let recipe = recipe.ok_or_else(|| Error::not_found("No recipe exists with specified id"))?;

    session.authenticate_owner(
        recipe.author_id,
        ActionType::ManageOwnRecipes,
        ActionType::ManageAllRecipes,
    )?;

    let associations = prepare_associations(&form.tags, &form.ingredients, &mut tx).await?;

    sqlx::query(
        "UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&fields.name)
    .bind(&fields.image)
    .bind(&fields.text)
    .bind(fields.cooking_time)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    replace_associations(id, &associations, &mut tx).await?;

    tx.commit().await?;
    debug!("User {} updated recipe {id}", session.user_id);

    get_recipe_view(id, Some(session.user_id), pool).await
}

/// Deletes the recipe; its ingredient lines, tags, favorites and cart entries cascade.
pub async fn delete_recipe(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = require_recipe(id, pool).await?;

    session.authenticate_owner(
        recipe.author_id,
        ActionType::ManageOwnRecipes,
        ActionType::ManageAllRecipes,
    )?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    info!("User {} deleted recipe {id}", session.user_id);

    Ok(())
}
