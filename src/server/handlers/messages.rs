use axum::{
    extract::Extension,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;
use crate::entities::Message;
use crate::error::Error;
use crate::server::extract::{Json, Path};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct MessageParams {
    body: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(trip_id): Path<Uuid>,
    Json(params): Json<MessageParams>,
) -> Result<(StatusCode, Json<Message>), Error> {
    let message = api.send_message(user, trip_id, params.body).await?;

    Ok((StatusCode::CREATED, message.into()))
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, Error> {
    let messages = api.list_messages(user, trip_id).await?;

    Ok(messages.into())
}
