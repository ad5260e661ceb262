use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
    pub details: Option<Value>,
}

const INVALID_TRANSITION: i32 = 100;
const VALIDATION: i32 = 101;
const UNAUTHENTICATED: i32 = 102;
const FORBIDDEN: i32 = 103;
const NOT_FOUND: i32 = 104;

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// A precondition on trip or bid status was not met. `current` is the
    /// status observed under the row lock, `attempted` the action or status
    /// the caller asked for.
    pub fn invalid_transition(
        message: impl Into<String>,
        current: impl Display,
        attempted: impl Display,
    ) -> Self {
        Self {
            code: INVALID_TRANSITION,
            message: message.into(),
            details: Some(json!({
                "current": current.to_string(),
                "attempted": attempted.to_string(),
            })),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(VALIDATION, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(UNAUTHENTICATED, "authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(FORBIDDEN, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(NOT_FOUND, format!("{} not found", what))
    }

    pub fn is_invalid_transition(&self) -> bool {
        self.code == INVALID_TRANSITION
    }

    pub fn is_validation(&self) -> bool {
        self.code == VALIDATION
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.code == UNAUTHENTICATED
    }

    pub fn is_forbidden(&self) -> bool {
        self.code == FORBIDDEN
    }

    pub fn is_not_found(&self) -> bool {
        self.code == NOT_FOUND
    }

    pub fn is_internal(&self) -> bool {
        (1..=99).contains(&self.code)
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            UNAUTHENTICATED => StatusCode::UNAUTHORIZED,
            FORBIDDEN => StatusCode::FORBIDDEN,
            NOT_FOUND => StatusCode::NOT_FOUND,
            INVALID_TRANSITION | VALIDATION => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        authorizor_error(err)
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        token_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if self.is_internal() {
            tracing::error!(code = self.code, message = %self.message, "request failed");

            json!({
                "code": self.code,
                "error": "Internal Server Error",
            })
        } else {
            let mut body = json!({
                "code": self.code,
                "error": self.message,
            });
            if let Some(details) = self.details {
                body["details"] = details;
            }
            body
        };

        (status, Json(body)).into_response()
    }
}

pub fn env_var_error(err: env::VarError) -> Error {
    Error::new(1, format!("environment variable error: {}", err))
}

pub fn database_error<T: Debug>(err: T) -> Error {
    Error::new(2, format!("database error: {:?}", err))
}

pub fn authorizor_error<T: Debug>(err: T) -> Error {
    Error::new(3, format!("authorizor error: {:?}", err))
}

pub fn token_error<T: Debug>(err: T) -> Error {
    Error::new(4, format!("token error: {:?}", err))
}

pub fn unexpected_error(message: impl Into<String>) -> Error {
    Error::new(5, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(Error::unauthenticated().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::forbidden("nope").status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::not_found("trip").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::invalid_transition("trip is not open for bidding", "accepted", "accept_bid")
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            unexpected_error("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_transition_carries_current_and_attempted() {
        let err = Error::invalid_transition("trip is not in accepted state", "open", "en_route");

        assert!(err.is_invalid_transition());
        let details = err.details.unwrap();
        assert_eq!(details["current"], "open");
        assert_eq!(details["attempted"], "en_route");
    }

    #[test]
    fn not_found_names_the_resource() {
        assert_eq!(Error::not_found("bid").message, "bid not found");
    }

    #[test]
    fn internal_errors_are_grouped() {
        assert!(database_error("x").is_internal());
        assert!(!Error::validation("x").is_internal());
    }
}
