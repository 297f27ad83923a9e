use std::convert::Infallible;

use serde::de::DeserializeOwned;
use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, Filter};

use crate::{
    jwt::{JwtKeys, SessionData},
    middleware::{with_possible_session, with_session},
    schema::Uuid,
};

const BODY_LIMIT: u64 = 1024 * 1024;

/// Everything a handler needs besides the request itself.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub keys: JwtKeys,
}

impl Context {
    pub fn new(pool: Pool<Postgres>, keys: JwtKeys) -> Self {
        Self { pool, keys }
    }

    pub fn pool(&self) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
        let pool = self.pool.clone();
        warp::any().map(move || pool.clone())
    }

    pub fn keys(&self) -> impl Filter<Extract = (JwtKeys,), Error = Infallible> + Clone {
        let keys = self.keys.clone();
        warp::any().map(move || keys.clone())
    }

    pub fn session(&self) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
        with_session(self.keys.clone())
    }

    pub fn possible_session(
        &self,
    ) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
        with_possible_session(self.keys.clone())
    }
}

pub fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

/// The raw query string, empty when the request has none.
pub fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

pub fn viewer(session: &Option<SessionData>) -> Option<Uuid> {
    session.as_ref().map(|s| s.user_id)
}
