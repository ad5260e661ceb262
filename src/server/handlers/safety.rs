use axum::{
    extract::Extension,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;
use crate::entities::{Block, Report, ReportRequest};
use crate::error::Error;
use crate::server::extract::{Json, Path};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct BlockParams {
    user_id: Uuid,
}

pub async fn block(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Json(params): Json<BlockParams>,
) -> Result<Json<Block>, Error> {
    let block = api.block(user, params.user_id).await?;

    Ok(block.into())
}

pub async fn unblock(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    api.unblock(user, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn report(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Json(params): Json<ReportRequest>,
) -> Result<(StatusCode, Json<Report>), Error> {
    let report = api.report(user, params).await?;

    Ok((StatusCode::CREATED, report.into()))
}
