use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::Identity;
use crate::entities::{
    Attestation, Bid, BidRequest, BidView, Block, Member, Message, Report, ReportRequest, Trip,
    TripRequest,
};
use crate::error::Error;
use crate::notifier::TripEvent;

/// Outcome of the accept-bid transaction. Returned to the rider only, so it
/// carries the plaintext pickup code.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Acceptance {
    pub trip: Trip,
    pub bid: Bid,
    pub pickup_code: String,
}

#[async_trait]
pub trait TripAPI {
    async fn create_trip(&self, user: Identity, request: TripRequest) -> Result<Trip, Error>;
    async fn find_trip(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;
    async fn list_my_trips(&self, user: Identity) -> Result<Vec<Trip>, Error>;
    async fn list_open_trips(&self, user: Identity) -> Result<Vec<Trip>, Error>;

    async fn accept_bid(&self, user: Identity, id: Uuid, bid_id: Uuid)
        -> Result<Acceptance, Error>;
    async fn start_en_route(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;
    async fn mark_arrived(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;
    async fn verify_pickup_code(&self, user: Identity, id: Uuid, code: String)
        -> Result<bool, Error>;
    async fn start_trip(&self, user: Identity, id: Uuid, code: String) -> Result<Trip, Error>;
    async fn confirm_payment(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;
    async fn complete_trip(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;
    async fn confirm_completion(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;
    async fn cancel_trip(&self, user: Identity, id: Uuid) -> Result<Trip, Error>;

    /// Expires every stale open trip and returns how many changed.
    async fn expire_stale_trips(&self) -> Result<u64, Error>;

    async fn subscribe(
        &self,
        user: Identity,
        id: Uuid,
    ) -> Result<broadcast::Receiver<TripEvent>, Error>;
}

#[async_trait]
pub trait BidAPI {
    async fn submit_bid(&self, user: Identity, trip_id: Uuid, request: BidRequest)
        -> Result<Bid, Error>;
    async fn list_bids(&self, user: Identity, trip_id: Uuid) -> Result<Vec<BidView>, Error>;
    async fn list_my_bids(&self, user: Identity) -> Result<Vec<Bid>, Error>;
    async fn withdraw_bid(&self, user: Identity, id: Uuid) -> Result<Bid, Error>;
}

#[async_trait]
pub trait SafetyAPI {
    async fn block(&self, user: Identity, target_id: Uuid) -> Result<Block, Error>;
    async fn unblock(&self, user: Identity, target_id: Uuid) -> Result<(), Error>;
    async fn is_blocked(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool, Error>;
    async fn report(&self, user: Identity, request: ReportRequest) -> Result<Report, Error>;
}

#[async_trait]
pub trait MemberAPI {
    async fn register_member(&self, user: Identity) -> Result<Member, Error>;
    async fn find_member(&self, user: Identity) -> Result<Member, Error>;
    async fn record_verification(&self, driver_id: Uuid, attestation: Attestation)
        -> Result<Member, Error>;
}

#[async_trait]
pub trait MessageAPI {
    async fn send_message(&self, user: Identity, trip_id: Uuid, body: String)
        -> Result<Message, Error>;
    async fn list_messages(&self, user: Identity, trip_id: Uuid) -> Result<Vec<Message>, Error>;
}

#[async_trait]
pub trait HealthAPI {
    async fn check_health(&self) -> Result<(), Error>;
}

pub trait API: TripAPI + BidAPI + SafetyAPI + MemberAPI + MessageAPI + HealthAPI {}
