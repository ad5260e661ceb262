use oso::{Oso, PolarClass};

use crate::auth::{Identity, Platform};
use crate::entities::{Bid, Trip};
use crate::error::Error;

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class())?;
    o.register_class(Identity::get_polar_class())?;
    o.register_class(Trip::get_polar_class())?;
    o.register_class(Bid::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{sample_trip_request, Role};
    use chrono::Utc;
    use uuid::Uuid;

    fn rider() -> Identity {
        Identity::new(Uuid::new_v4(), Role::Rider, true)
    }

    fn driver() -> Identity {
        Identity::new(Uuid::new_v4(), Role::Driver, true)
    }

    fn trip_for(rider: &Identity) -> Trip {
        Trip::new(rider.id, sample_trip_request(), Utc::now())
    }

    #[test]
    fn platform_actions_follow_role() {
        let authorizor = new().unwrap();

        assert!(authorizor.is_allowed(rider(), "create_trip", Platform).unwrap());
        assert!(!authorizor.is_allowed(driver(), "create_trip", Platform).unwrap());

        assert!(authorizor.is_allowed(driver(), "browse_trips", Platform).unwrap());
        assert!(!authorizor.is_allowed(rider(), "browse_trips", Platform).unwrap());
    }

    #[test]
    fn owning_rider_actions() {
        let authorizor = new().unwrap();
        let owner = rider();
        let stranger = rider();
        let trip = trip_for(&owner);

        for action in ["read", "list_bids", "accept_bid", "confirm_payment", "confirm_completion", "cancel"] {
            assert!(authorizor.is_allowed(owner.clone(), action, trip.clone()).unwrap(), "{}", action);
            assert!(!authorizor.is_allowed(stranger.clone(), action, trip.clone()).unwrap(), "{}", action);
        }

        // riders never drive their own trip
        assert!(!authorizor.is_allowed(owner.clone(), "start_en_route", trip.clone()).unwrap());
        assert!(!authorizor.is_allowed(owner, "start_trip", trip).unwrap());
    }

    #[test]
    fn driver_actions_require_the_accepted_bid() {
        let authorizor = new().unwrap();
        let owner = rider();
        let mut trip = trip_for(&owner);
        let winner = driver();
        let loser = driver();

        // before acceptance nobody may drive the trip
        assert!(!authorizor.is_allowed(winner.clone(), "start_en_route", trip.clone()).unwrap());
        assert!(!authorizor.is_allowed(winner.clone(), "cancel", trip.clone()).unwrap());

        let mut bid = Bid::new(trip.id, winner.id, 2000, None, Utc::now());
        trip.accept_bid(&mut bid, &mut [], Utc::now()).unwrap();

        for action in ["read", "start_en_route", "mark_arrived", "verify_pickup", "start_trip", "complete", "cancel", "message"] {
            assert!(authorizor.is_allowed(winner.clone(), action, trip.clone()).unwrap(), "{}", action);
            assert!(!authorizor.is_allowed(loser.clone(), action, trip.clone()).unwrap(), "{}", action);
        }

        // driver-only confirmations stay with the rider
        assert!(!authorizor.is_allowed(winner.clone(), "confirm_payment", trip.clone()).unwrap());
        assert!(!authorizor.is_allowed(winner, "accept_bid", trip).unwrap());
    }

    #[test]
    fn drivers_read_open_trips_only() {
        let authorizor = new().unwrap();
        let owner = rider();
        let mut trip = trip_for(&owner);
        let browsing = driver();

        assert!(authorizor.is_allowed(browsing.clone(), "read", trip.clone()).unwrap());
        assert!(authorizor.is_allowed(browsing.clone(), "submit_bid", trip.clone()).unwrap());
        assert!(!authorizor.is_allowed(owner.clone(), "submit_bid", trip.clone()).unwrap());

        trip.cancel(Utc::now()).unwrap();
        assert!(!authorizor.is_allowed(browsing, "read", trip).unwrap());
    }

    #[test]
    fn only_the_bidder_withdraws() {
        let authorizor = new().unwrap();
        let bidder = driver();
        let bid = Bid::new(Uuid::new_v4(), bidder.id, 1000, None, Utc::now());

        assert!(authorizor.is_allowed(bidder, "withdraw", bid.clone()).unwrap());
        assert!(!authorizor.is_allowed(driver(), "withdraw", bid.clone()).unwrap());
        assert!(!authorizor.is_allowed(rider(), "withdraw", bid).unwrap());
    }
}
