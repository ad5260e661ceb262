use super::helpers::{
    fetch_bid_for_update, fetch_submitted_bids_for_update, fetch_trip_for_update, insert_trip,
    update_bid, update_trip, upsert_member,
};
use super::Engine;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, types::Json, Executor, Row};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    api::{Acceptance, TripAPI},
    auth::{Identity, Platform},
    entities::{BidStatus, Role, Trip, TripRequest, TripStatus},
    error::Error,
    notifier::TripEvent,
    pickup_code,
};

/// Upper bound on trips expired per sweep transaction.
const SWEEP_BATCH_SIZE: i64 = 500;

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self, request), fields(user_id = %user.id))]
    async fn create_trip(&self, user: Identity, request: TripRequest) -> Result<Trip, Error> {
        user.require_role(Role::Rider)?;
        request.validate()?;
        self.authorize(user.clone(), "create_trip", Platform)?;

        let now = Utc::now();
        let trip = Trip::new(user.id, request, now);

        let mut tx = self.pool.begin().await?;

        upsert_member(&mut tx, &user, now).await?;
        insert_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        tracing::info!(trip_id = %trip.id, "trip posted");

        Ok(trip.view_for(&user.id))
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn find_trip(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        let trip = self.fetch_trip(&id).await?;

        self.authorize(user.clone(), "read", trip.clone())?;

        Ok(trip.view_for(&user.id))
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn list_my_trips(&self, user: Identity) -> Result<Vec<Trip>, Error> {
        let query = match user.role {
            Role::Rider => "SELECT data FROM trips WHERE rider_id = $1 ORDER BY created_at DESC",
            Role::Driver => "SELECT data FROM trips WHERE driver_id = $1 ORDER BY created_at DESC",
        };

        let rows = self
            .pool
            .fetch_all(sqlx::query(query).bind(&user.id))
            .await?;

        let trips = rows_to_trips(&rows)?;

        Ok(trips.iter().map(|trip| trip.view_for(&user.id)).collect())
    }

    /// The driver ride board. Stale open trips are hidden even before the
    /// sweep has marked them expired.
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn list_open_trips(&self, user: Identity) -> Result<Vec<Trip>, Error> {
        user.require_role(Role::Driver)?;
        self.authorize(user.clone(), "browse_trips", Platform)?;

        let rows = self
            .pool
            .fetch_all(
                sqlx::query(
                    "SELECT t.data FROM trips t
                     WHERE t.status = $1
                       AND t.expires_at > $2
                       AND NOT EXISTS (
                           SELECT 1 FROM blocks b
                           WHERE b.blocker_id = $3 AND b.blocked_id = t.rider_id
                       )
                     ORDER BY t.created_at DESC",
                )
                .bind(TripStatus::Open.name())
                .bind(Utc::now())
                .bind(&user.id),
            )
            .await?;

        let trips = rows_to_trips(&rows)?;

        Ok(trips.iter().map(Trip::redacted).collect())
    }

    /// Accepts one bid and rejects its competitors in a single transaction.
    /// The trip row is locked first, then the bids, the same order every
    /// other bid-touching operation uses.
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn accept_bid(
        &self,
        user: Identity,
        id: Uuid,
        bid_id: Uuid,
    ) -> Result<Acceptance, Error> {
        user.require_role(Role::Rider)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "accept_bid", trip.clone())?;

        if trip.status != TripStatus::Open {
            return Err(Error::invalid_transition(
                "trip is not open for bidding",
                trip.status,
                TripStatus::Accepted,
            ));
        }

        let mut bid = fetch_bid_for_update(&mut tx, &bid_id).await?;

        let mut siblings: Vec<_> = fetch_submitted_bids_for_update(&mut tx, &trip.id, None)
            .await?
            .into_iter()
            .filter(|sibling| sibling.id != bid.id)
            .collect();

        let pickup_code = trip.accept_bid(&mut bid, &mut siblings, now)?;

        update_trip(&mut tx, &trip).await?;
        update_bid(&mut tx, &bid).await?;

        for sibling in siblings.iter().filter(|s| s.status == BidStatus::Rejected) {
            update_bid(&mut tx, sibling).await?;
        }

        tx.commit().await?;

        tracing::info!(
            trip_id = %trip.id,
            bid_id = %bid.id,
            rejected = siblings.len(),
            "bid accepted"
        );

        self.notifier.publish(&trip);

        Ok(Acceptance {
            trip: trip.view_for(&user.id),
            bid,
            pickup_code,
        })
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn start_en_route(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        user.require_role(Role::Driver)?;

        self.transition(user, id, "start_en_route", |trip, now| {
            trip.start_en_route(now)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn mark_arrived(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        user.require_role(Role::Driver)?;

        self.transition(user, id, "mark_arrived", |trip, now| trip.mark_arrived(now))
            .await
    }

    /// Read-only: no lock is taken and nothing changes, whatever the answer.
    #[tracing::instrument(skip(self, code), fields(user_id = %user.id))]
    async fn verify_pickup_code(
        &self,
        user: Identity,
        id: Uuid,
        code: String,
    ) -> Result<bool, Error> {
        user.require_role(Role::Driver)?;

        let trip = self.fetch_trip(&id).await?;

        self.authorize(user.clone(), "verify_pickup", trip.clone())?;

        let valid = trip.check_pickup_code(&code)?;

        tracing::info!(trip_id = %trip.id, valid, "pickup code checked");

        Ok(valid)
    }

    #[tracing::instrument(skip(self, code), fields(user_id = %user.id))]
    async fn start_trip(&self, user: Identity, id: Uuid, code: String) -> Result<Trip, Error> {
        user.require_role(Role::Driver)?;

        if !pickup_code::is_well_formed(&code) {
            return Err(Error::validation("pickup code must be exactly 4 digits"));
        }

        self.transition(user, id, "start_trip", move |trip, now| trip.start(&code, now))
            .await
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn confirm_payment(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        user.require_role(Role::Rider)?;

        self.transition(user, id, "confirm_payment", |trip, now| {
            trip.confirm_payment(now)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn complete_trip(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        user.require_role(Role::Driver)?;

        self.transition(user, id, "complete", |trip, now| trip.complete(now))
            .await
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn confirm_completion(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        user.require_role(Role::Rider)?;

        self.transition(user, id, "confirm_completion", |trip, now| {
            trip.confirm_completion(now)
        })
        .await
    }

    /// Riders may cancel their own trip, drivers only a trip whose accepted
    /// bid they hold. The accepted bid is withdrawn in the same transaction.
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn cancel_trip(&self, user: Identity, id: Uuid) -> Result<Trip, Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), "cancel", trip.clone())?;

        let released = trip.cancel(now)?;

        update_trip(&mut tx, &trip).await?;

        if let Some(bid_id) = released {
            let mut bid = fetch_bid_for_update(&mut tx, &bid_id).await?;
            bid.release()?;
            update_bid(&mut tx, &bid).await?;
        }

        tx.commit().await?;

        tracing::info!(trip_id = %trip.id, by = %user.role, "trip cancelled");

        self.notifier.publish(&trip);

        Ok(trip.view_for(&user.id))
    }

    /// Safe to run from several workers at once: rows locked by another sweep
    /// are skipped and expiry only ever moves `open` to `expired`.
    #[tracing::instrument(skip(self))]
    async fn expire_stale_trips(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let rows = tx
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM trips
                     WHERE status = $1 AND expires_at < $2
                     ORDER BY expires_at ASC
                     LIMIT $3
                     FOR UPDATE SKIP LOCKED",
                )
                .bind(TripStatus::Open.name())
                .bind(now)
                .bind(SWEEP_BATCH_SIZE),
            )
            .await?;

        let mut expired = Vec::new();

        for mut trip in rows_to_trips(&rows)? {
            if trip.expire(now) {
                update_trip(&mut tx, &trip).await?;
                expired.push(trip);
            }
        }

        tx.commit().await?;

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale trips");
        }

        for trip in &expired {
            self.notifier.publish(trip);
        }

        Ok(expired.len() as u64)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn subscribe(
        &self,
        user: Identity,
        id: Uuid,
    ) -> Result<broadcast::Receiver<TripEvent>, Error> {
        let trip = self.fetch_trip(&id).await?;

        self.authorize(user, "read", trip.clone())?;

        Ok(self.notifier.subscribe(&trip))
    }
}

impl Engine {
    pub(super) async fn fetch_trip(&self, id: &Uuid) -> Result<Trip, Error> {
        let Json(trip): Json<Trip> = self
            .pool
            .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1").bind(id))
            .await?
            .ok_or_else(|| Error::not_found("trip"))?
            .try_get("data")?;

        Ok(trip)
    }

    /// Lock, authorize, apply, write, commit, then notify. A failing `apply`
    /// drops the transaction, which rolls it back.
    async fn transition<F>(
        &self,
        user: Identity,
        id: Uuid,
        action: &'static str,
        apply: F,
    ) -> Result<Trip, Error>
    where
        F: FnOnce(&mut Trip, DateTime<Utc>) -> Result<(), Error> + Send,
    {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(user.clone(), action, trip.clone())?;

        let previous = trip.status;
        apply(&mut trip, now)?;

        update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        tracing::info!(
            trip_id = %trip.id,
            from = %previous,
            to = %trip.status,
            "trip transitioned"
        );

        self.notifier.publish(&trip);

        Ok(trip.view_for(&user.id))
    }
}

fn rows_to_trips(rows: &[PgRow]) -> Result<Vec<Trip>, Error> {
    rows.iter()
        .map(|row| -> Result<Trip, Error> {
            let Json(trip): Json<Trip> = row.try_get("data")?;
            Ok(trip)
        })
        .collect()
}
