use std::convert::Infallible;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::api::Acceptance;
use crate::auth::Identity;
use crate::entities::{Trip, TripRequest};
use crate::error::Error;
use crate::server::extract::{Json, Path};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct AcceptBidParams {
    #[serde(alias = "bidId")]
    bid_id: Uuid,
}

#[derive(Serialize, Deserialize)]
pub struct PickupCodeParams {
    #[serde(alias = "pickupCode")]
    pickup_code: String,
}

#[derive(Serialize, Deserialize)]
pub struct PickupCodeCheck {
    valid: bool,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Json(params): Json<TripRequest>,
) -> Result<(StatusCode, Json<Trip>), Error> {
    let trip = api.create_trip(user, params).await?;

    Ok((StatusCode::CREATED, trip.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.find_trip(user, id).await?;

    Ok(trip.into())
}

pub async fn list_mine(
    Extension(api): Extension<DynAPI>,
    user: Identity,
) -> Result<Json<Vec<Trip>>, Error> {
    let trips = api.list_my_trips(user).await?;

    Ok(trips.into())
}

pub async fn list_open(
    Extension(api): Extension<DynAPI>,
    user: Identity,
) -> Result<Json<Vec<Trip>>, Error> {
    let trips = api.list_open_trips(user).await?;

    Ok(trips.into())
}

pub async fn accept_bid(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
    Json(params): Json<AcceptBidParams>,
) -> Result<Json<Acceptance>, Error> {
    let acceptance = api.accept_bid(user, id, params.bid_id).await?;

    Ok(acceptance.into())
}

pub async fn start_en_route(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.start_en_route(user, id).await?;

    Ok(trip.into())
}

pub async fn mark_arrived(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.mark_arrived(user, id).await?;

    Ok(trip.into())
}

pub async fn verify_pickup(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
    Json(params): Json<PickupCodeParams>,
) -> Result<Json<PickupCodeCheck>, Error> {
    let valid = api.verify_pickup_code(user, id, params.pickup_code).await?;

    Ok(PickupCodeCheck { valid }.into())
}

pub async fn start_trip(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
    Json(params): Json<PickupCodeParams>,
) -> Result<Json<Trip>, Error> {
    let trip = api.start_trip(user, id, params.pickup_code).await?;

    Ok(trip.into())
}

pub async fn confirm_payment(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.confirm_payment(user, id).await?;

    Ok(trip.into())
}

pub async fn complete(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.complete_trip(user, id).await?;

    Ok(trip.into())
}

pub async fn confirm_completion(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.confirm_completion(user, id).await?;

    Ok(trip.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.cancel_trip(user, id).await?;

    Ok(trip.into())
}

/// One `trip` event per transition. A lagging client skips what it missed;
/// the stream ends once the trip settles and its channel closes.
pub async fn events(
    Extension(api): Extension<DynAPI>,
    user: Identity,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let receiver = api.subscribe(user, id).await?;

    let stream = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => match Event::default().event("trip").json_data(&event.trip) {
                    Ok(sse) => return Some((Ok::<_, Infallible>(sse), receiver)),
                    Err(err) => tracing::warn!(%err, "failed to encode trip event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "trip event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
