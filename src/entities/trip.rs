use std::fmt;

use chrono::{DateTime, Duration, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::bid::{Bid, Status as BidStatus};
use crate::entities::Place;
use crate::error::Error;
use crate::pickup_code;

/// Open trips expire this long after creation. Fixed at creation.
pub const TRIP_TTL_HOURS: i64 = 24;

const MAX_NOTES_LENGTH: usize = 500;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub pickup: Place,
    pub dropoff: Place,
    pub estimated_distance_km: f64,
    pub estimated_duration_minutes: u32,
    pub scheduled_pickup_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_bid_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub final_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_code_hash: Option<String>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rider_confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    Accepted,
    EnRoute,
    Arrived,
    CodeVerified,
    InProgress,
    Completed,
    RiderConfirmed,
    Cancelled,
    Expired,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::EnRoute => "en_route",
            Self::Arrived => "arrived",
            Self::CodeVerified => "code_verified",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::RiderConfirmed => "rider_confirmed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RiderConfirmed | Self::Cancelled | Self::Expired)
    }

    /// Edges of the lifecycle graph. Cancellation is reachable from every
    /// state before the rider has paid.
    pub fn can_transition_to(&self, next: Status) -> bool {
        use Status::*;

        matches!(
            (*self, next),
            (Open, Accepted)
                | (Open, Expired)
                | (Accepted, EnRoute)
                | (EnRoute, Arrived)
                | (Arrived, CodeVerified)
                | (CodeVerified, InProgress)
                | (InProgress, Completed)
                | (Completed, RiderConfirmed)
                | (Open | Accepted | EnRoute | Arrived | CodeVerified, Cancelled)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rider input for a new trip. Distance and duration come from the client's
/// estimate and are frozen on the trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripRequest {
    pub pickup: Place,
    pub dropoff: Place,
    pub estimated_distance_km: f64,
    pub estimated_duration_minutes: u32,
    pub scheduled_pickup_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), Error> {
        self.pickup.validate("pickup")?;
        self.dropoff.validate("dropoff")?;

        if !self.estimated_distance_km.is_finite() || self.estimated_distance_km < 0.0 {
            return Err(Error::validation(
                "estimated distance must be a non-negative number",
            ));
        }

        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LENGTH {
                return Err(Error::validation(format!(
                    "notes must be at most {} characters",
                    MAX_NOTES_LENGTH
                )));
            }
        }

        Ok(())
    }
}

impl Trip {
    pub fn new(rider_id: Uuid, request: TripRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            rider_id,
            pickup: request.pickup,
            dropoff: request.dropoff,
            estimated_distance_km: request.estimated_distance_km,
            estimated_duration_minutes: request.estimated_duration_minutes,
            scheduled_pickup_at: request.scheduled_pickup_at,
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
            status: Status::Open,
            created_at: now,
            expires_at: now + Duration::hours(TRIP_TTL_HOURS),
            accepted_bid_id: None,
            driver_id: None,
            final_amount: None,
            pickup_code: None,
            pickup_code_hash: None,
            en_route_at: None,
            arrived_at: None,
            picked_up_at: None,
            paid_at: None,
            completed_at: None,
            rider_confirmed_at: None,
            cancelled_at: None,
        }
    }

    pub fn is_rider(&self, user_id: &Uuid) -> bool {
        self.rider_id == *user_id
    }

    pub fn is_driver(&self, user_id: &Uuid) -> bool {
        self.driver_id.as_ref() == Some(user_id)
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn ensure_open_for_bids(&self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != Status::Open {
            return Err(Error::invalid_transition(
                "trip is not open for bidding",
                self.status,
                "submit_bid",
            ));
        }

        if self.is_stale(now) {
            return Err(Error::invalid_transition(
                "trip has expired",
                Status::Expired,
                "submit_bid",
            ));
        }

        Ok(())
    }

    /// Accepts `bid`, rejects every other submitted bid in `siblings` and
    /// issues the pickup code. Nothing is mutated unless all preconditions
    /// hold. Returns the plaintext code, which only the rider may see.
    #[tracing::instrument(skip_all, fields(trip_id = %self.id, bid_id = %bid.id))]
    pub fn accept_bid(
        &mut self,
        bid: &mut Bid,
        siblings: &mut [Bid],
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        if self.status != Status::Open {
            return Err(Error::invalid_transition(
                "trip is not open for bidding",
                self.status,
                Status::Accepted,
            ));
        }

        if self.is_stale(now) {
            return Err(Error::invalid_transition(
                "trip has expired",
                Status::Expired,
                Status::Accepted,
            ));
        }

        if bid.trip_id != self.id {
            return Err(Error::not_found("bid"));
        }

        if bid.status != BidStatus::Submitted {
            return Err(Error::invalid_transition(
                "bid is not in submitted state",
                bid.status,
                BidStatus::Accepted,
            ));
        }

        let code = pickup_code::generate_code();

        bid.status = BidStatus::Accepted;

        for sibling in siblings
            .iter_mut()
            .filter(|s| s.trip_id == self.id && s.id != bid.id)
            .filter(|s| s.status == BidStatus::Submitted)
        {
            sibling.status = BidStatus::Rejected;
        }

        self.status = Status::Accepted;
        self.accepted_bid_id = Some(bid.id);
        self.driver_id = Some(bid.driver_id);
        self.final_amount = Some(bid.amount);
        self.pickup_code_hash = Some(pickup_code::hash(&code));
        self.pickup_code = Some(code.clone());

        Ok(code)
    }

    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn start_en_route(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.advance(Status::Accepted, Status::EnRoute)?;
        self.en_route_at = Some(now);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn mark_arrived(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.advance(Status::EnRoute, Status::Arrived)?;
        self.arrived_at = Some(now);
        Ok(())
    }

    /// Read-only check of a driver-entered code.
    pub fn check_pickup_code(&self, code: &str) -> Result<bool, Error> {
        match &self.pickup_code_hash {
            Some(stored_hash) => Ok(pickup_code::verify(code, stored_hash)),
            None => Err(Error::invalid_transition(
                "no pickup code has been issued for this trip",
                self.status,
                "verify_pickup",
            )),
        }
    }

    /// Consumes the pickup code: the trip can only start once the driver has
    /// entered the code the rider holds.
    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn start(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != Status::Arrived {
            return Err(Error::invalid_transition(
                "trip is not in arrived state",
                self.status,
                Status::CodeVerified,
            ));
        }

        if !self.check_pickup_code(code)? {
            return Err(Error::validation("pickup code does not match"));
        }

        self.advance(Status::Arrived, Status::CodeVerified)?;
        self.picked_up_at = Some(now);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn confirm_payment(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.advance(Status::CodeVerified, Status::InProgress)?;
        self.paid_at = Some(now);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.advance(Status::InProgress, Status::Completed)?;
        self.completed_at = Some(now);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn confirm_completion(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.advance(Status::Completed, Status::RiderConfirmed)?;
        self.rider_confirmed_at = Some(now);
        Ok(())
    }

    /// Returns the accepted bid, if any, which the caller must withdraw in the
    /// same transaction. Code and amount are kept on the record.
    #[tracing::instrument(skip_all, fields(trip_id = %self.id))]
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Option<Uuid>, Error> {
        if !self.status.can_transition_to(Status::Cancelled) {
            return Err(Error::invalid_transition(
                format!("trip can no longer be cancelled from {} state", self.status),
                self.status,
                Status::Cancelled,
            ));
        }

        self.status = Status::Cancelled;
        self.cancelled_at = Some(now);

        Ok(self.accepted_bid_id)
    }

    /// Lazy expiry of unbid requests. Returns whether the trip changed, so a
    /// repeated sweep over an already expired trip is a no-op.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != Status::Open || !self.is_stale(now) {
            return false;
        }

        self.status = Status::Expired;
        true
    }

    /// The record as seen by `viewer`: only the owning rider gets the
    /// plaintext code and nobody gets the hash.
    pub fn view_for(&self, viewer: &Uuid) -> Trip {
        let mut trip = self.redacted();
        if self.is_rider(viewer) {
            trip.pickup_code = self.pickup_code.clone();
        }
        trip
    }

    pub fn redacted(&self) -> Trip {
        Trip {
            pickup_code: None,
            pickup_code_hash: None,
            ..self.clone()
        }
    }

    fn advance(&mut self, required: Status, next: Status) -> Result<(), Error> {
        if self.status != required {
            return Err(Error::invalid_transition(
                format!("trip is not in {} state", required),
                self.status,
                next,
            ));
        }

        if !self.status.can_transition_to(next) {
            return Err(Error::invalid_transition(
                format!("trip cannot move from {} to {}", self.status, next),
                self.status,
                next,
            ));
        }

        self.status = next;
        Ok(())
    }
}

impl PolarClass for Trip {
    fn get_polar_class_builder() -> oso::ClassBuilder<Trip> {
        oso::Class::builder()
            .name("Trip")
            .add_attribute_getter("id", |recv: &Trip| recv.id.to_string())
            .add_attribute_getter("rider_id", |recv: &Trip| recv.rider_id.to_string())
            .add_attribute_getter("status", |recv: &Trip| recv.status.name().to_string())
            .add_method("is_driver", |recv: &Trip, user_id: String| {
                recv.driver_id
                    .map(|id| id.to_string() == user_id)
                    .unwrap_or(false)
            })
    }

    fn get_polar_class() -> oso::Class {
        let builder = Trip::get_polar_class_builder();
        builder.build()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::Coordinates;

    pub(crate) fn request() -> TripRequest {
        TripRequest {
            pickup: Place {
                address: "12 Elm St".into(),
                coordinates: Coordinates { lat: 40.0, lng: -75.0 },
            },
            dropoff: Place {
                address: "400 Oak Ave".into(),
                coordinates: Coordinates { lat: 40.1, lng: -75.1 },
            },
            estimated_distance_km: 10.0,
            estimated_duration_minutes: 18,
            scheduled_pickup_at: Utc::now() + Duration::hours(2),
            notes: Some("two bags".into()),
        }
    }

    fn bid(trip: &Trip, amount: i64, now: DateTime<Utc>) -> Bid {
        Bid::new(trip.id, Uuid::new_v4(), amount, None, now)
    }

    fn accepted_trip(now: DateTime<Utc>) -> (Trip, Bid) {
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);
        let mut winner = bid(&trip, 2000, now);
        trip.accept_bid(&mut winner, &mut [], now).unwrap();
        (trip, winner)
    }

    #[test]
    fn new_trip_is_open_and_expires_after_a_day() {
        let now = Utc::now();
        let trip = Trip::new(Uuid::new_v4(), request(), now);

        assert_eq!(trip.status, Status::Open);
        assert_eq!(trip.expires_at - trip.created_at, Duration::hours(24));
        assert!(trip.pickup_code.is_none());
        assert!(trip.pickup_code_hash.is_none());
        assert!(trip.final_amount.is_none());
    }

    #[test]
    fn blank_notes_are_dropped() {
        let mut req = request();
        req.notes = Some("   ".into());

        let trip = Trip::new(Uuid::new_v4(), req, Utc::now());
        assert!(trip.notes.is_none());
    }

    #[test]
    fn request_validation() {
        let mut req = request();
        req.estimated_distance_km = -1.0;
        assert!(req.validate().unwrap_err().is_validation());

        let mut req = request();
        req.notes = Some("x".repeat(501));
        assert!(req.validate().is_err());

        assert!(request().validate().is_ok());
    }

    #[test]
    fn happy_path() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);
        let mut a = bid(&trip, 2000, now);
        let b = bid(&trip, 1800, now);
        let mut siblings = vec![b];

        let code = trip.accept_bid(&mut a, &mut siblings, now).unwrap();

        assert_eq!(trip.status, Status::Accepted);
        assert_eq!(a.status, BidStatus::Accepted);
        assert_eq!(siblings[0].status, BidStatus::Rejected);
        assert_eq!(trip.final_amount, Some(2000));
        assert_eq!(trip.driver_id, Some(a.driver_id));
        assert_eq!(trip.accepted_bid_id, Some(a.id));
        assert_eq!(code.len(), 4);
        assert_eq!(trip.pickup_code.as_deref(), Some(code.as_str()));

        trip.start_en_route(now).unwrap();
        assert_eq!(trip.status, Status::EnRoute);
        trip.mark_arrived(now).unwrap();
        assert_eq!(trip.status, Status::Arrived);
        trip.start(&code, now).unwrap();
        assert_eq!(trip.status, Status::CodeVerified);
        trip.confirm_payment(now).unwrap();
        assert_eq!(trip.status, Status::InProgress);
        trip.complete(now).unwrap();
        assert_eq!(trip.status, Status::Completed);
        trip.confirm_completion(now).unwrap();
        assert_eq!(trip.status, Status::RiderConfirmed);
        assert!(trip.status.is_terminal());

        assert!(trip.en_route_at.is_some());
        assert!(trip.arrived_at.is_some());
        assert!(trip.picked_up_at.is_some());
        assert!(trip.paid_at.is_some());
        assert!(trip.completed_at.is_some());
        assert!(trip.rider_confirmed_at.is_some());
    }

    #[test]
    fn wrong_code_leaves_trip_arrived() {
        let now = Utc::now();
        let (mut trip, _) = accepted_trip(now);
        trip.pickup_code = Some("4821".into());
        trip.pickup_code_hash = Some(pickup_code::hash("4821"));
        trip.start_en_route(now).unwrap();
        trip.mark_arrived(now).unwrap();

        let err = trip.start("0000", now).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(trip.status, Status::Arrived);
        assert!(trip.picked_up_at.is_none());

        trip.start("4821", now).unwrap();
        assert_eq!(trip.status, Status::CodeVerified);
    }

    #[test]
    fn start_before_arrival_is_an_invalid_transition() {
        let now = Utc::now();
        let (mut trip, _) = accepted_trip(now);
        let code = trip.pickup_code.clone().unwrap();

        let err = trip.start(&code, now).unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(err.message, "trip is not in arrived state");
        assert_eq!(trip.status, Status::Accepted);
    }

    #[test]
    fn check_pickup_code_requires_issued_code() {
        let now = Utc::now();
        let trip = Trip::new(Uuid::new_v4(), request(), now);
        assert!(trip.check_pickup_code("1234").unwrap_err().is_invalid_transition());

        let (trip, _) = accepted_trip(now);
        let code = trip.pickup_code.clone().unwrap();
        assert!(trip.check_pickup_code(&code).unwrap());
        assert!(!trip.check_pickup_code("12x4").unwrap());
        assert_eq!(trip.status, Status::Accepted);
    }

    #[test]
    fn second_accept_loses() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);
        let mut first = bid(&trip, 2000, now);
        let mut second = bid(&trip, 1800, now);

        trip.accept_bid(&mut first, &mut [second.clone()], now)
            .unwrap();
        let code = trip.pickup_code.clone();
        let err = trip.accept_bid(&mut second, &mut [], now).unwrap_err();

        assert!(err.is_invalid_transition());
        assert_eq!(err.message, "trip is not open for bidding");
        assert_eq!(second.status, BidStatus::Submitted);
        assert_eq!(trip.accepted_bid_id, Some(first.id));
        assert_eq!(trip.final_amount, Some(2000));
        assert_eq!(trip.pickup_code, code);
    }

    #[test]
    fn accept_rejects_foreign_or_settled_bids_without_mutation() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);

        let mut foreign = Bid::new(Uuid::new_v4(), Uuid::new_v4(), 100, None, now);
        assert!(trip.accept_bid(&mut foreign, &mut [], now).unwrap_err().is_not_found());
        assert_eq!(trip.status, Status::Open);

        let mut withdrawn = bid(&trip, 100, now);
        withdrawn.withdraw().unwrap();
        let mut other = bid(&trip, 200, now);
        let mut siblings = [other.clone()];
        let err = trip.accept_bid(&mut withdrawn, &mut siblings, now).unwrap_err();

        assert!(err.is_invalid_transition());
        assert_eq!(trip.status, Status::Open);
        assert_eq!(siblings[0].status, BidStatus::Submitted);
        assert!(trip.final_amount.is_none());

        trip.accept_bid(&mut other, &mut [], now).unwrap();
    }

    #[test]
    fn accept_after_expiry_fails() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);
        let mut b = bid(&trip, 100, now);

        let later = now + Duration::hours(25);
        assert!(trip.accept_bid(&mut b, &mut [], later).unwrap_err().is_invalid_transition());
        assert!(trip.ensure_open_for_bids(later).is_err());
        assert!(trip.ensure_open_for_bids(now).is_ok());
    }

    #[test]
    fn cancellation_returns_accepted_bid_and_blocks_progress() {
        let now = Utc::now();
        let (mut trip, winner) = accepted_trip(now);
        let amount = trip.final_amount;
        let code = trip.pickup_code.clone();

        assert_eq!(trip.cancel(now).unwrap(), Some(winner.id));
        assert_eq!(trip.status, Status::Cancelled);
        assert_eq!(trip.final_amount, amount);
        assert_eq!(trip.pickup_code, code);

        let err = trip.start_en_route(now).unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(trip.cancel(now).unwrap_err().is_invalid_transition());
    }

    #[test]
    fn open_trip_cancels_without_bid() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);
        assert_eq!(trip.cancel(now).unwrap(), None);
    }

    #[test]
    fn no_cancellation_after_payment() {
        let now = Utc::now();
        let (mut trip, _) = accepted_trip(now);
        let code = trip.pickup_code.clone().unwrap();
        trip.start_en_route(now).unwrap();
        trip.mark_arrived(now).unwrap();
        trip.start(&code, now).unwrap();
        trip.confirm_payment(now).unwrap();

        assert!(trip.cancel(now).unwrap_err().is_invalid_transition());
        trip.complete(now).unwrap();
        assert!(trip.cancel(now).unwrap_err().is_invalid_transition());
        assert_eq!(trip.status, Status::Completed);
    }

    #[test]
    fn expiry_is_idempotent() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);
        let expires_at = trip.expires_at;

        assert!(!trip.expire(now));
        assert_eq!(trip.status, Status::Open);

        let later = now + Duration::hours(24) + Duration::seconds(1);
        assert!(trip.expire(later));
        assert_eq!(trip.status, Status::Expired);
        assert!(!trip.expire(later));
        assert_eq!(trip.status, Status::Expired);
        assert_eq!(trip.expires_at, expires_at);
    }

    #[test]
    fn accepted_trip_never_expires() {
        let now = Utc::now();
        let (mut trip, _) = accepted_trip(now);
        assert!(!trip.expire(now + Duration::days(3)));
        assert_eq!(trip.status, Status::Accepted);
    }

    #[test]
    fn transition_graph_is_monotonic() {
        use Status::*;

        let all = [
            Open,
            Accepted,
            EnRoute,
            Arrived,
            CodeVerified,
            InProgress,
            Completed,
            RiderConfirmed,
            Cancelled,
            Expired,
        ];
        let rank = |s: Status| all.iter().position(|x| *x == s).unwrap();

        for from in all {
            for to in all {
                if from.can_transition_to(to) {
                    assert!(!from.is_terminal(), "{} is terminal", from);
                    if to != Cancelled && to != Expired {
                        assert_eq!(rank(to), rank(from) + 1, "{} -> {} skips", from, to);
                    }
                }
            }
            assert!(!from.can_transition_to(from));
        }
    }

    #[test]
    fn out_of_order_actions_name_the_required_state() {
        let now = Utc::now();
        let mut trip = Trip::new(Uuid::new_v4(), request(), now);

        let err = trip.start_en_route(now).unwrap_err();
        assert_eq!(err.message, "trip is not in accepted state");
        assert!(trip.mark_arrived(now).is_err());
        assert!(trip.confirm_payment(now).is_err());
        assert!(trip.complete(now).is_err());
        assert!(trip.confirm_completion(now).is_err());
        assert_eq!(trip.status, Status::Open);
    }

    #[test]
    fn views_hide_the_code_from_everyone_but_the_rider() {
        let now = Utc::now();
        let (trip, winner) = accepted_trip(now);

        let rider_view = trip.view_for(&trip.rider_id);
        assert!(rider_view.pickup_code.is_some());
        assert!(rider_view.pickup_code_hash.is_none());

        let driver_view = trip.view_for(&winner.driver_id);
        assert!(driver_view.pickup_code.is_none());
        assert!(driver_view.pickup_code_hash.is_none());

        let json = serde_json::to_value(&driver_view).unwrap();
        assert!(json.get("pickup_code").is_none());
        assert!(json.get("pickup_code_hash").is_none());
    }

    #[test]
    fn stored_record_round_trips_secret_fields() {
        let now = Utc::now();
        let (trip, _) = accepted_trip(now);

        let json = serde_json::to_string(&trip).unwrap();
        let back: Trip = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pickup_code_hash, trip.pickup_code_hash);
        assert_eq!(back.status, Status::Accepted);
    }
}
