//! HTTP surface of the backend, everything mounted under `/api`.

mod filters;
mod recipes;
mod rejection;
mod tags;
mod users;

use std::convert::Infallible;

use warp::{Filter, Reply};

pub use filters::Context;
pub use recipes::shopping_list_reply;
pub use rejection::handle_rejection;

pub fn routes(ctx: &Context) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api = users::auth_routes(ctx)
        .or(users::user_routes(ctx))
        .or(tags::tag_routes(ctx))
        .or(tags::ingredient_routes(ctx))
        .or(recipes::recipe_routes(ctx));

    warp::path("api")
        .and(api)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;
    use warp::http::StatusCode;

    use super::*;
    use crate::{
        jwt::{generate_jwt_session, JwtKeys},
        schema::{User, UserRole},
    };

    // The pool never connects; every request below is settled before a query runs
    fn context() -> Context {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://foodgram@localhost/foodgram")
            .unwrap();
        Context::new(pool, JwtKeys::new(b"routes-secret", 1).unwrap())
    }

    fn token(ctx: &Context, role: UserRole) -> String {
        let user = User {
            id: 5,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Ada"),
            last_name: String::from("Lovelace"),
            password: String::new(),
            role,
        };
        format!("Token {}", generate_jwt_session(&user, &ctx.keys).unwrap())
    }

    #[tokio::test]
    async fn unknown_paths_are_json_404() {
        let ctx = context();
        let response = warp::test::request()
            .path("/api/nothing/here")
            .reply(&routes(&ctx))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), br#"{"errors":"Not found"}"#);
    }

    #[tokio::test]
    async fn writes_need_a_session() {
        let ctx = context();
        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes")
            .json(&serde_json::json!({
                "name": "Pancakes",
                "text": "Mix and fry.",
                "image": "media/pancakes.png",
                "cooking_time": 20,
                "tags": [1],
                "ingredients": [{"id": 1, "amount": 200}],
            }))
            .reply(&routes(&ctx))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = warp::test::request()
            .path("/api/recipes/download_shopping_cart")
            .reply(&routes(&ctx))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn anonymous_viewers_cannot_filter_by_favorites() {
        let ctx = context();
        let response = warp::test::request()
            .path("/api/recipes?is_favorited=1")
            .reply(&routes(&ctx))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_filters_are_rejected() {
        let ctx = context();
        let response = warp::test::request()
            .path("/api/recipes?author=someone")
            .reply(&routes(&ctx))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tag_management_is_for_admins() {
        let ctx = context();
        let response = warp::test::request()
            .method("POST")
            .path("/api/tags")
            .header("authorization", token(&ctx, UserRole::User))
            .json(&serde_json::json!({
                "name": "Breakfast",
                "color": "#E26C2D",
                "slug": "breakfast",
            }))
            .reply(&routes(&ctx))
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = warp::test::request()
            .method("DELETE")
            .path("/api/tags/1")
            .header("authorization", token(&ctx, UserRole::User))
            .reply(&routes(&ctx))
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_payloads_are_bad_requests() {
        let ctx = context();
        let response = warp::test::request()
            .method("POST")
            .path("/api/auth/token/login")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&routes(&ctx))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
