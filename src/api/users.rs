use sqlx::{Pool, Postgres};
use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, Filter, Reply};

use super::filters::{json_body, viewer, Context};
use crate::{
    actions::{
        fetch_subscriptions, fetch_users, get_user_view, login_user, register_user, set_password,
        subscribe, unsubscribe,
    },
    form::{LoginForm, RegisterForm, SetPasswordForm, SubscriptionQuery},
    jwt::{JwtKeys, SessionData},
    pagination::PageQuery,
    schema::{AuthToken, Uuid},
};

async fn login(
    form: LoginForm,
    keys: JwtKeys,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let auth_token = login_user(&form, &keys, &pool).await?;
    Ok(warp::reply::json(&AuthToken { auth_token }))
}

// Tokens are stateless, so logging out only checks that the caller had a valid one
async fn logout(_session: SessionData) -> Result<impl Reply, Rejection> {
    Ok(StatusCode::NO_CONTENT)
}

async fn register(form: RegisterForm, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = register_user(&form, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        StatusCode::CREATED,
    ))
}

async fn list_users(
    query: PageQuery,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let page = fetch_users(query, viewer(&session), &pool).await?;
    Ok(warp::reply::json(&page))
}

async fn me(session: SessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = get_user_view(&pool, session.user_id, Some(session.user_id)).await?;
    Ok(warp::reply::json(&user))
}

async fn user(
    id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let user = get_user_view(&pool, id, viewer(&session)).await?;
    Ok(warp::reply::json(&user))
}

async fn change_password(
    form: SetPasswordForm,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    set_password(&form, &session, &pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn subscriptions(
    query: SubscriptionQuery,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let page =
        fetch_subscriptions(query.page_query(), query.recipes_limit, &session, &pool).await?;
    Ok(warp::reply::json(&page))
}

async fn subscribe_to(
    author_id: Uuid,
    query: SubscriptionQuery,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let subscription = subscribe(author_id, query.recipes_limit, &session, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&subscription),
        StatusCode::CREATED,
    ))
}

async fn unsubscribe_from(
    author_id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    unsubscribe(author_id, &session, &pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn auth_routes(ctx: &Context) -> BoxedFilter<(impl Reply,)> {
    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(ctx.keys())
        .and(ctx.pool())
        .and_then(login);

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(ctx.session())
        .and_then(logout);

    login.or(logout).boxed()
}

pub fn user_routes(ctx: &Context) -> BoxedFilter<(impl Reply,)> {
    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(ctx.pool())
        .and_then(register);

    let list = warp::path!("users")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(ctx.possible_session())
        .and(ctx.pool())
        .and_then(list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(json_body())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(change_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<SubscriptionQuery>())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(subscriptions);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(warp::query::<SubscriptionQuery>())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(subscribe_to);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(unsubscribe_from);

    let user = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(ctx.possible_session())
        .and(ctx.pool())
        .and_then(user);

    register
        .or(list)
        .or(me)
        .or(set_password)
        .or(subscriptions)
        .or(subscribe)
        .or(unsubscribe)
        .or(user)
        .boxed()
}
