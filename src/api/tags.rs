use sqlx::{Pool, Postgres};
use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, Filter, Reply};

use super::filters::{json_body, Context};
use crate::{
    actions::{
        create_product, create_tag, delete_tag, get_product, get_tag, list_tags, search_products,
    },
    authentication::permissions::ActionType,
    error::Error,
    form::{ProductForm, ProductSearch, TagForm},
    jwt::SessionData,
    schema::Uuid,
};

async fn tags(pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tags = list_tags(&pool).await?;
    Ok(warp::reply::json(&tags))
}

async fn tag(id: Uuid, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tag = get_tag(id, &pool)
        .await?
        .ok_or_else(|| Error::not_found("No tag exists with specified id"))?;
    Ok(warp::reply::json(&tag))
}

async fn new_tag(
    form: TagForm,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageTags)?;

    let tag = create_tag(&form, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&tag),
        StatusCode::CREATED,
    ))
}

async fn remove_tag(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageTags)?;

    delete_tag(id, &pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ingredients(
    search: ProductSearch,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let products = search_products(search.name.as_deref().unwrap_or_default(), &pool).await?;
    Ok(warp::reply::json(&products))
}

async fn ingredient(id: Uuid, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let product = get_product(id, &pool)
        .await?
        .ok_or_else(|| Error::not_found("No ingredient exists with specified id"))?;
    Ok(warp::reply::json(&product))
}

async fn new_ingredient(
    form: ProductForm,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageProducts)?;

    let product = create_product(&form, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&product),
        StatusCode::CREATED,
    ))
}

pub fn tag_routes(ctx: &Context) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(ctx.pool())
        .and_then(tags);

    let get = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(ctx.pool())
        .and_then(tag);

    let create = warp::path!("tags")
        .and(warp::post())
        .and(json_body())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(new_tag);

    let delete = warp::path!("tags" / Uuid)
        .and(warp::delete())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(remove_tag);

    list.or(get).or(create).or(delete).boxed()
}

pub fn ingredient_routes(ctx: &Context) -> BoxedFilter<(impl Reply,)> {
    let search = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<ProductSearch>())
        .and(ctx.pool())
        .and_then(ingredients);

    let get = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(ctx.pool())
        .and_then(ingredient);

    let create = warp::path!("ingredients")
        .and(warp::post())
        .and(json_body())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(new_ingredient);

    search.or(get).or(create).boxed()
}
