use sqlx::{Pool, Postgres};

use crate::{
    error::Error,
    form::TagForm,
    schema::{Tag, Uuid},
};

pub async fn create_tag(form: &TagForm, pool: &Pool<Postgres>) -> Result<Tag, Error> {
    let form = form.validate()?;

    let tag: Option<Tag> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(&form.name)
    .bind(&form.color)
    .bind(&form.slug)
    .fetch_optional(pool)
    .await?;

    tag.ok_or_else(|| Error::conflict("A tag with that slug already exists"))
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn list_recipe_tags(pool: &Pool<Postgres>, recipe_id: Uuid) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

/// Removes an unused tag. Tags still attached to a recipe are restricted by the schema,
/// which surfaces here as a conflict.
pub async fn delete_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::conflict("Tag is still used by recipes"),
            e => e,
        })?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("No tag exists with specified id"));
    }

    Ok(())
}
