use warp::{reject::Rejection, Filter};

use super::jwt::{verify_jwt_session, JwtKeys, SessionData};
use crate::error::Error;

/// Extracts the token from `Authorization: Token <jwt>` or `Authorization: Bearer <jwt>`.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    match scheme {
        "Token" | "Bearer" if !token.is_empty() => Some(token),
        _ => None,
    }
}

fn session_from_header(header: Option<String>, keys: &JwtKeys) -> Result<SessionData, Error> {
    let header =
        header.ok_or_else(|| Error::unauthorized("Authentication credentials were not provided"))?;
    let token = parse_authorization(&header)
        .ok_or_else(|| Error::unauthorized("Invalid session; Malformed authorization header"))?;

    verify_jwt_session(token, keys).map(SessionData::from)
}

pub fn with_session(
    keys: JwtKeys,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move { session_from_header(header, &keys).map_err(Rejection::from) }
    })
}

/// Like [`with_session`], but anonymous requests pass through as `None`.
pub fn with_possible_session(
    keys: JwtKeys,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let keys = keys.clone();
        async move {
            match header {
                None => Ok(None),
                Some(header) => session_from_header(Some(header), &keys)
                    .map(Some)
                    .map_err(Rejection::from),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::generate_jwt_session,
        schema::{User, UserRole},
    };

    fn keys() -> JwtKeys {
        JwtKeys::new(b"middleware-secret", 1).unwrap()
    }

    fn token() -> String {
        let user = User {
            id: 3,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Ada"),
            last_name: String::from("Lovelace"),
            password: String::new(),
            role: UserRole::User,
        };
        generate_jwt_session(&user, &keys()).unwrap()
    }

    #[test]
    fn authorization_schemes() {
        assert_eq!(parse_authorization("Token abc"), Some("abc"));
        assert_eq!(parse_authorization("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization("Basic abc"), None);
        assert_eq!(parse_authorization("Token "), None);
        assert_eq!(parse_authorization("abc"), None);
    }

    #[tokio::test]
    async fn session_is_extracted() {
        let filter = with_session(keys());
        let session = warp::test::request()
            .header("authorization", format!("Token {}", token()))
            .filter(&filter)
            .await
            .unwrap();

        assert_eq!(session.user_id, 3);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let filter = with_session(keys());
        let result = warp::test::request().filter(&filter).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn anonymous_requests_are_allowed_when_optional() {
        let filter = with_possible_session(keys());
        let session = warp::test::request().filter(&filter).await.unwrap();
        assert!(session.is_none());

        let bad = warp::test::request()
            .header("authorization", "Token garbage")
            .filter(&filter)
            .await;
        assert!(bad.is_err());
    }
}
