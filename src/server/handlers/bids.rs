use axum::{
    extract::Extension,
    http::StatusCode,
};
use uuid::Uuid;

use crate::auth::Identity;
use crate::entities::{Bid, BidRequest, BidView};
use crate::error::Error;
use crate::server::extract::{Json, Path};
use crate::server::DynAPI;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(trip_id): Path<Uuid>,
    Json(params): Json<BidRequest>,
) -> Result<(StatusCode, Json<Bid>), Error> {
    let bid = api.submit_bid(user, trip_id, params).await?;

    Ok((StatusCode::CREATED, bid.into()))
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<BidView>>, Error> {
    let bids = api.list_bids(user, trip_id).await?;

    Ok(bids.into())
}

pub async fn list_mine(
    Extension(api): Extension<DynAPI>,
    user: Identity,
) -> Result<Json<Vec<Bid>>, Error> {
    let bids = api.list_my_bids(user).await?;

    Ok(bids.into())
}

pub async fn withdraw(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Bid>, Error> {
    let bid = api.withdraw_bid(user, id).await?;

    Ok(bid.into())
}
