use super::Database;

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    auth::Identity,
    entities::{Bid, BidStatus, Member, Trip},
    error::Error,
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_trip_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Trip, Error> {
    let Json(trip): Json<Trip> = tx
        .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| Error::not_found("trip"))?
        .try_get("data")?;

    Ok(trip)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_bid_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Bid, Error> {
    let Json(bid): Json<Bid> = tx
        .fetch_optional(sqlx::query("SELECT data FROM bids WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(|| Error::not_found("bid"))?
        .try_get("data")?;

    Ok(bid)
}

/// Locks the submitted bids on a trip, optionally only those of one driver.
#[tracing::instrument(skip(tx))]
pub async fn fetch_submitted_bids_for_update(
    tx: &mut Transaction<'_, Database>,
    trip_id: &Uuid,
    driver_id: Option<&Uuid>,
) -> Result<Vec<Bid>, Error> {
    let rows = tx
        .fetch_all(
            sqlx::query(
                "SELECT data FROM bids
                 WHERE trip_id = $1 AND status = $2 AND ($3::UUID IS NULL OR driver_id = $3)
                 ORDER BY created_at ASC, id ASC
                 FOR UPDATE",
            )
            .bind(trip_id)
            .bind(BidStatus::Submitted.name())
            .bind(driver_id.copied()),
        )
        .await?;

    rows.iter()
        .map(|row| -> Result<Bid, Error> {
            let Json(bid): Json<Bid> = row.try_get("data")?;
            Ok(bid)
        })
        .collect()
}

#[tracing::instrument(skip(tx, trip), fields(trip_id = %trip.id))]
pub async fn insert_trip(tx: &mut Transaction<'_, Database>, trip: &Trip) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO trips (id, rider_id, driver_id, status, expires_at, created_at, data)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&trip.id)
        .bind(&trip.rider_id)
        .bind(&trip.driver_id)
        .bind(trip.status.name())
        .bind(&trip.expires_at)
        .bind(&trip.created_at)
        .bind(Json(trip)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, trip), fields(trip_id = %trip.id, status = %trip.status))]
pub async fn update_trip(tx: &mut Transaction<'_, Database>, trip: &Trip) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE trips SET status = $2, driver_id = $3, data = $4 WHERE id = $1")
            .bind(&trip.id)
            .bind(trip.status.name())
            .bind(&trip.driver_id)
            .bind(Json(trip)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, bid), fields(bid_id = %bid.id))]
pub async fn insert_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO bids (id, trip_id, driver_id, status, created_at, data)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&bid.id)
        .bind(&bid.trip_id)
        .bind(&bid.driver_id)
        .bind(bid.status.name())
        .bind(&bid.created_at)
        .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, bid), fields(bid_id = %bid.id, status = %bid.status))]
pub async fn update_bid(tx: &mut Transaction<'_, Database>, bid: &Bid) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE bids SET status = $2, data = $3 WHERE id = $1")
            .bind(&bid.id)
            .bind(bid.status.name())
            .bind(Json(bid)),
    )
    .await?;

    Ok(())
}

/// Creates the member row on first sight of an identity. Role and creation
/// time are never overwritten; the email flag follows the latest token.
#[tracing::instrument(skip(tx, user), fields(user_id = %user.id))]
pub async fn upsert_member(
    tx: &mut Transaction<'_, Database>,
    user: &Identity,
    now: DateTime<Utc>,
) -> Result<Member, Error> {
    let member = Member::new(user.id, user.role, user.email_verified, now);

    let Json(member): Json<Member> = tx
        .fetch_one(
            sqlx::query(
                "INSERT INTO members (id, role, created_at, data) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (id) DO UPDATE
                 SET data = jsonb_set(members.data, '{email_verified}', to_jsonb($5::BOOLEAN))
                 RETURNING data",
            )
            .bind(&member.id)
            .bind(member.role.name())
            .bind(&member.created_at)
            .bind(Json(&member))
            .bind(user.email_verified),
        )
        .await?
        .try_get("data")?;

    Ok(member)
}
