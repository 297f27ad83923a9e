use std::convert::Infallible;

use log::{error, warn};
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{InvalidQuery, MethodNotAllowed, PayloadTooLarge, Rejection},
    Reply,
};

use crate::error::{Error, ErrorBody};

fn describe(err: &Rejection) -> (StatusCode, String) {
    if let Some(e) = err.find::<Error>() {
        return (e.status(), e.public_message());
    }
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, String::from("Not found"));
    }
    if let Some(e) = err.find::<BodyDeserializeError>() {
        return (StatusCode::BAD_REQUEST, format!("Malformed payload ({e})"));
    }
    if err.find::<InvalidQuery>().is_some() {
        return (StatusCode::BAD_REQUEST, String::from("Malformed query string"));
    }
    if err.find::<PayloadTooLarge>().is_some() {
        return (StatusCode::PAYLOAD_TOO_LARGE, String::from("Payload too large"));
    }
    if err.find::<MethodNotAllowed>().is_some() {
        return (StatusCode::METHOD_NOT_ALLOWED, String::from("Method not allowed"));
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        String::from("Internal server error"),
    )
}

/// Renders every rejection as `{"errors": "..."}` with the matching status.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = describe(&err);

    if status.is_server_error() {
        error!("Request failed: {err:?}");
    } else if status != StatusCode::NOT_FOUND {
        warn!("Request rejected ({status}): {message}");
    }

    let body = ErrorBody { errors: message };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: Rejection) -> (StatusCode, serde_json::Value) {
        let response = handle_rejection(err).await.unwrap().into_response();
        let status = response.status();
        let bytes = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn domain_errors_keep_their_status() {
        let (status, body) = render(Error::conflict("Recipe is already in favorites").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"], "Recipe is already in favorites");

        let (status, _) = render(Error::forbidden("nope").into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn query_errors_are_hidden() {
        let (status, body) = render(Error::Query(String::from("deadlock detected")).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"], "Internal server error");
    }

    #[tokio::test]
    async fn unknown_routes() {
        let (status, body) = render(warp::reject::not_found()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"], "Not found");
    }
}
