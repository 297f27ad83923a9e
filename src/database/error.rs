use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use warp::http::StatusCode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_string())
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_string())
    }

    pub fn unauthorized(info: &str) -> Self {
        Self::Unauthorized(info.to_string())
    }

    pub fn forbidden(info: &str) -> Self {
        Self::Forbidden(info.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicates are reported as bad requests, which is what clients of the API expect
            Error::Validation(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Query(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Server-side failures are not leaked.
    pub fn public_message(&self) -> String {
        match self {
            Error::Query(_) | Error::Config(_) | Error::Internal(_) => {
                String::from("Internal server error")
            }
            _ => self.to_string(),
        }
    }
}

/// Body of every error response: `{"errors": "..."}`.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub errors: String,
}

impl From<&Error> for ErrorBody {
    fn from(value: &Error) -> Self {
        Self {
            errors: value.public_message(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::not_found("Not found"),
            sqlx::Error::Database(e) => match e.kind() {
                ErrorKind::UniqueViolation => Self::conflict("Entry already exists"),
                ErrorKind::ForeignKeyViolation => {
                    Self::conflict("Referenced entry does not exist")
                }
                ErrorKind::CheckViolation => Self::conflict("Constraint violated"),
                ErrorKind::NotNullViolation => Self::conflict("Missing required value"),
                _ => Self::Query(format!("{e}")),
            },
            sqlx::Error::PoolTimedOut => Self::Query(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Query(String::from("Pool closed")),
            sqlx::Error::Migrate(e) => Self::Query(format!("{e}")),
            e => Self::Query(format!("{e}")),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::Internal(format!("Password hashing failed ({value})"))
    }
}

impl From<jwt::Error> for Error {
    fn from(value: jwt::Error) -> Self {
        Self::Internal(format!("Failed to sign session ({value})"))
    }
}

impl warp::reject::Reject for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(Error::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::conflict("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::Query(String::from("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let error: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[test]
    fn internal_details_are_hidden() {
        let body = ErrorBody::from(&Error::Query(String::from("relation users missing")));
        assert_eq!(body.errors, "Internal server error");

        let body = ErrorBody::from(&Error::validation("Cooking time must be at least 1"));
        assert_eq!(body.errors, "Cooking time must be at least 1");
    }

    #[test]
    fn errors_travel_as_rejections() {
        let rejection: warp::Rejection = Error::forbidden("Only the author may change this").into();
        let error = rejection.find::<Error>().unwrap();
        assert_eq!(error.status(), StatusCode::FORBIDDEN);
    }
}
