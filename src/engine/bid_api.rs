use super::helpers::{
    fetch_bid_for_update, fetch_submitted_bids_for_update, fetch_trip_for_update, insert_bid,
    update_bid, upsert_member,
};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::BidAPI,
    auth::Identity,
    entities::{Bid, BidRequest, BidView, Member, Role, TripStatus},
    error::Error,
};

#[async_trait]
impl BidAPI for Engine {
    /// A driver's earlier submitted bid on the same trip is withdrawn and
    /// replaced in the same transaction.
    #[tracing::instrument(skip(self, request), fields(user_id = %user.id))]
    async fn submit_bid(
        &self,
        user: Identity,
        trip_id: Uuid,
        request: BidRequest,
    ) -> Result<Bid, Error> {
        user.require_role(Role::Driver)?;
        user.require_email_verified()?;
        request.validate()?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let trip = fetch_trip_for_update(&mut tx, &trip_id).await?;

        self.authorize(user.clone(), "submit_bid", trip.clone())?;

        trip.ensure_open_for_bids(now)?;

        upsert_member(&mut tx, &user, now).await?;

        let previous = fetch_submitted_bids_for_update(&mut tx, &trip.id, Some(&user.id)).await?;

        for mut previous in previous {
            previous.withdraw()?;
            update_bid(&mut tx, &previous).await?;
        }

        let bid = Bid::new(trip.id, user.id, request.amount, request.message, now);
        insert_bid(&mut tx, &bid).await?;

        tx.commit().await?;

        tracing::info!(trip_id = %trip.id, bid_id = %bid.id, "bid submitted");

        Ok(bid)
    }

    /// Every bid on the trip in submission order, whatever its status. Bids
    /// from drivers the rider has blocked are left out.
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn list_bids(&self, user: Identity, trip_id: Uuid) -> Result<Vec<BidView>, Error> {
        user.require_role(Role::Rider)?;

        let trip = self.fetch_trip(&trip_id).await?;

        self.authorize(user.clone(), "list_bids", trip.clone())?;

        let rows = self
            .pool
            .fetch_all(
                sqlx::query(
                    "SELECT b.data AS bid, m.data AS member, (
                         SELECT COUNT(*) FROM trips t
                         WHERE t.driver_id = b.driver_id AND t.status IN ($3, $4)
                     ) AS completed_trip_count
                     FROM bids b
                     LEFT JOIN members m ON m.id = b.driver_id
                     WHERE b.trip_id = $1
                       AND NOT EXISTS (
                           SELECT 1 FROM blocks k
                           WHERE k.blocker_id = $2 AND k.blocked_id = b.driver_id
                       )
                     ORDER BY b.created_at ASC, b.id ASC",
                )
                .bind(&trip.id)
                .bind(&user.id)
                .bind(TripStatus::Completed.name())
                .bind(TripStatus::RiderConfirmed.name()),
            )
            .await?;

        let now = Utc::now();

        rows.iter()
            .map(|row| -> Result<BidView, Error> {
                let Json(bid): Json<Bid> = row.try_get("bid")?;
                let member: Option<Json<Member>> = row.try_get("member")?;
                let completed_trip_count: i64 = row.try_get("completed_trip_count")?;

                let member = match member {
                    Some(Json(member)) => member,
                    None => Member::new(bid.driver_id, Role::Driver, false, bid.created_at),
                };

                Ok(BidView {
                    driver: member.driver_context(completed_trip_count, now),
                    bid,
                })
            })
            .collect()
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn list_my_bids(&self, user: Identity) -> Result<Vec<Bid>, Error> {
        user.require_role(Role::Driver)?;

        let rows = self
            .pool
            .fetch_all(
                sqlx::query("SELECT data FROM bids WHERE driver_id = $1 ORDER BY created_at DESC")
                    .bind(&user.id),
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<Bid, Error> {
                let Json(bid): Json<Bid> = row.try_get("data")?;
                Ok(bid)
            })
            .collect()
    }

    /// Locks the trip before the bid so a withdrawal never interleaves with
    /// an acceptance of the same bid.
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn withdraw_bid(&self, user: Identity, id: Uuid) -> Result<Bid, Error> {
        user.require_role(Role::Driver)?;

        let mut tx = self.pool.begin().await?;

        let trip_id: Uuid = tx
            .fetch_optional(sqlx::query("SELECT trip_id FROM bids WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(|| Error::not_found("bid"))?
            .try_get("trip_id")?;

        fetch_trip_for_update(&mut tx, &trip_id).await?;
        let mut bid = fetch_bid_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "withdraw", bid.clone())?;

        bid.withdraw()?;

        update_bid(&mut tx, &bid).await?;

        tx.commit().await?;

        tracing::info!(bid_id = %bid.id, "bid withdrawn");

        Ok(bid)
    }
}
