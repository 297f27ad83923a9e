use sqlx::{Pool, Postgres};

use super::{get_user_by_id, get_user_view, list_author_recipes};
use crate::{
    authentication::permissions::ActionType,
    constants::USER_COUNT_PER_PAGE,
    error::Error,
    jwt::SessionData,
    pagination::{Page, PageContext, PageQuery},
    schema::{SubscriptionView, UserRow, Uuid},
};

async fn subscription_view(
    author_id: Uuid,
    viewer: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, Error> {
    let author = get_user_view(pool, author_id, Some(viewer)).await?;
    let recipes = list_author_recipes(author_id, recipes_limit, pool).await?;

    let recipes_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(SubscriptionView {
        author,
        recipes,
        recipes_count: recipes_count.0,
    })
}

pub async fn subscribe(
    author_id: Uuid,
    recipes_limit: Option<i64>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(Error::not_found("No user exists with specified id"));
    }
    if author_id == session.user_id {
        return Err(Error::conflict("You can not subscribe to yourself"));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::conflict("You are already subscribed to this author"));
    }

    subscription_view(author_id, session.user_id, recipes_limit, pool).await
}

pub async fn unsubscribe(
    author_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(Error::not_found("No user exists with specified id"));
    }

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::validation("You are not subscribed to this author"));
    }

    Ok(())
}

/// Authors the user follows, each with their latest recipes.
pub async fn fetch_subscriptions(
    query: PageQuery,
    recipes_limit: Option<i64>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionView>, Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let page = Page::from_query(query, USER_COUNT_PER_PAGE);

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name, TRUE AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(subscription_view(row.user.id, session.user_id, recipes_limit, pool).await?);
    }

    PageContext::from_rows(views, total_count, page)
}
