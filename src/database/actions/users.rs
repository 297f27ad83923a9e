use log::info;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, JwtKeys, SessionData},
    },
    constants::USER_COUNT_PER_PAGE,
    error::Error,
    form::{validate_password, LoginForm, RegisterForm, SetPasswordForm},
    pagination::{Page, PageContext, PageQuery},
    schema::{User, UserRow, UserView, Uuid},
};

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// A user as seen by `viewer`; `is_subscribed` is false for anonymous viewers.
pub async fn get_user_view(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<UserView, Error> {
    let row: Option<UserView> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = $2) AS is_subscribed
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(user_id)
    .bind(viewer)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| Error::not_found("No user exists with specified id"))
}

pub async fn fetch_users(
    query: PageQuery,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserView>, Error> {
    let page = Page::from_query(query, USER_COUNT_PER_PAGE);

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.email, u.id, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = $1) AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer)
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, page)?.map(|row| row.user);

    Ok(page)
}

/// Creates a user from a registration form; the password is stored as an argon2 hash.
pub async fn register_user(form: &RegisterForm, pool: &Pool<Postgres>) -> Result<UserView, Error> {
    let form = form.validate()?;
    let password = hash_password(&form.password)?;

    let row: Option<UserView> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING
        RETURNING email, id, username, first_name, last_name, FALSE AS is_subscribed
    ",
    )
    .bind(&form.email)
    .bind(&form.username)
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => {
            info!("Registered user {} ({})", user.username, user.id);
            Ok(user)
        }
        None => Err(Error::conflict(
            "A user with that email or username already exists",
        )),
    }
}

pub async fn login_user(
    form: &LoginForm,
    keys: &JwtKeys,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = get_user_by_email(pool, &form.email)
        .await?
        .ok_or_else(|| Error::validation("Invalid credentials"))?;

    if !verify_password(&form.password, &user.password)? {
        return Err(Error::validation("Invalid credentials"));
    }

    generate_jwt_session(&user, keys)
}

pub async fn set_password(
    form: &SetPasswordForm,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let user = get_user_by_id(pool, session.user_id)
        .await?
        .ok_or_else(|| Error::unauthorized("User no longer exists"))?;

    if !verify_password(&form.current_password, &user.password)? {
        return Err(Error::validation("Current password is incorrect"));
    }

    let password = hash_password(&validate_password(&form.new_password)?)?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user.id)
        .execute(pool)
        .await?;

    info!("User {} changed their password", user.id);

    Ok(())
}
