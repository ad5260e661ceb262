use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::HttpBody,
    extract::{Extension, FromRequest, RequestParts},
    http::header::AUTHORIZATION,
    response::{IntoResponse, Response},
    BoxError,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::auth::{Identity, TokenAuthority};
use crate::error::{unexpected_error, Error};

/// Resolves the caller from an `Authorization: Bearer <token>` header. Any
/// route taking an `Identity` is closed to anonymous callers.
#[async_trait]
impl<B: Send> FromRequest<B> for Identity {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(authority) = Extension::<Arc<TokenAuthority>>::from_request(req)
            .await
            .map_err(|_| unexpected_error("token authority is not configured"))?;

        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(Error::unauthenticated)?;

        authority.verify(token.trim())
    }
}

/// `axum::Json` that rejects unreadable bodies with a validation error.
pub struct Json<T>(pub T);

#[async_trait]
impl<T, B> FromRequest<B> for Json<T>
where
    T: DeserializeOwned + Send,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req)
            .await
            .map_err(|rejection| Error::validation(rejection.to_string()))?;

        Ok(Self(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

/// `axum::extract::Path` with the same treatment for malformed segments.
pub struct Path<T>(pub T);

#[async_trait]
impl<T, B> FromRequest<B> for Path<T>
where
    T: DeserializeOwned + Send,
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) = axum::extract::Path::<T>::from_request(req)
            .await
            .map_err(|rejection| Error::validation(rejection.to_string()))?;

        Ok(Self(value))
    }
}
