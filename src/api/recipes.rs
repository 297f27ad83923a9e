use sqlx::{Pool, Postgres};
use warp::{
    filters::BoxedFilter,
    http::{header, StatusCode},
    reject::Rejection,
    Filter, Reply,
};

use super::filters::{json_body, raw_query, viewer, Context};
use crate::{
    actions::{
        add_to_favorites, add_to_shopping_cart, build_shopping_list, create_recipe, delete_recipe,
        fetch_recipes, get_recipe_view, remove_from_favorites, remove_from_shopping_cart,
        update_recipe,
    },
    constants::SHOPPING_LIST_FILENAME,
    form::{RecipeFilter, RecipeForm},
    jwt::SessionData,
    schema::Uuid,
    shopping_list::ShoppingList,
};

/// The rendered list as a plain text attachment.
pub fn shopping_list_reply(list: &ShoppingList) -> impl Reply {
    let reply = warp::reply::with_header(
        list.render(),
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8",
    );

    warp::reply::with_header(
        reply,
        header::CONTENT_DISPOSITION,
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    )
}

async fn recipes(
    query: String,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let filter = RecipeFilter::from_query(&query)?;
    let page = fetch_recipes(&filter, viewer(&session), &pool).await?;
    Ok(warp::reply::json(&page))
}

async fn recipe(
    id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = get_recipe_view(id, viewer(&session), &pool).await?;
    Ok(warp::reply::json(&recipe))
}

async fn new_recipe(
    form: RecipeForm,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = create_recipe(&form, &session, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&recipe),
        StatusCode::CREATED,
    ))
}

async fn edit_recipe(
    id: Uuid,
    form: RecipeForm,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = update_recipe(id, &form, &session, &pool).await?;
    Ok(warp::reply::json(&recipe))
}

async fn remove_recipe(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    delete_recipe(id, &session, &pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn favorite(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = add_to_favorites(id, &session, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&recipe),
        StatusCode::CREATED,
    ))
}

async fn unfavorite(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    remove_from_favorites(id, &session, &pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_cart(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = add_to_shopping_cart(id, &session, &pool).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&recipe),
        StatusCode::CREATED,
    ))
}

async fn remove_from_cart(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    remove_from_shopping_cart(id, &session, &pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_shopping_cart(
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let list = build_shopping_list(&session, &pool).await?;
    Ok(shopping_list_reply(&list))
}

pub fn recipe_routes(ctx: &Context) -> BoxedFilter<(impl Reply,)> {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(raw_query())
        .and(ctx.possible_session())
        .and(ctx.pool())
        .and_then(recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(json_body())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(new_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(download_shopping_cart);

    let get = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(ctx.possible_session())
        .and(ctx.pool())
        .and_then(recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(json_body())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(edit_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(remove_recipe);

    let favorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::post())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(favorite);

    let unfavorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::delete())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(unfavorite);

    let add_to_cart = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::post())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(add_to_cart);

    let remove_from_cart = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::delete())
        .and(ctx.session())
        .and(ctx.pool())
        .and_then(remove_from_cart);

    list.or(create)
        .or(download)
        .or(get)
        .or(update)
        .or(delete)
        .or(favorite)
        .or(unfavorite)
        .or(add_to_cart)
        .or(remove_from_cart)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopping_list::CartIngredient;

    fn line(product_id: Uuid, name: &str, unit: &str, amount: i32) -> CartIngredient {
        CartIngredient {
            product_id,
            name: String::from(name),
            measurement_unit: String::from(unit),
            amount,
        }
    }

    #[tokio::test]
    async fn download_is_a_text_attachment() {
        let list = ShoppingList::aggregate(vec![
            line(1, "Flour", "g", 200),
            line(2, "Sugar", "g", 100),
            line(1, "Flour", "g", 300),
        ]);
        let response = shopping_list_reply(&list).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=shopping_list.txt"
        );

        let bytes = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(body, "Ingredients:\nFlour - 500 g.\nSugar - 100 g.\n");
    }
}
