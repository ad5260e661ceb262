use std::fmt;

use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::member::DriverContext;
use crate::error::Error;

const MAX_MESSAGE_LENGTH: usize = 500;

/// A driver's price offer. The driver sets the whole amount (minor currency
/// units); there is no floor, ceiling or suggestion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub amount: i64,
    pub message: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Submitted,
    Accepted,
    Rejected,
    Withdrawn,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidRequest {
    pub amount: i64,
    pub message: Option<String>,
}

impl BidRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount <= 0 {
            return Err(Error::validation("bid amount must be positive"));
        }

        if let Some(message) = &self.message {
            if message.chars().count() > MAX_MESSAGE_LENGTH {
                return Err(Error::validation(format!(
                    "bid message must be at most {} characters",
                    MAX_MESSAGE_LENGTH
                )));
            }
        }

        Ok(())
    }
}

/// A bid as listed to the owning rider, next to neutral facts about the
/// driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidView {
    #[serde(flatten)]
    pub bid: Bid,
    pub driver: DriverContext,
}

impl Bid {
    pub fn new(
        trip_id: Uuid,
        driver_id: Uuid,
        amount: i64,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Bid {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            amount,
            message: message.filter(|m| !m.trim().is_empty()),
            status: Status::Submitted,
            created_at: now,
        }
    }

    #[tracing::instrument(skip_all, fields(bid_id = %self.id))]
    pub fn withdraw(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Submitted => {
                self.status = Status::Withdrawn;
                Ok(())
            }
            _ => Err(Error::invalid_transition(
                "bid is not in submitted state",
                self.status,
                Status::Withdrawn,
            )),
        }
    }

    /// Withdrawal caused by the trip being cancelled after acceptance.
    #[tracing::instrument(skip_all, fields(bid_id = %self.id))]
    pub fn release(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Accepted => {
                self.status = Status::Withdrawn;
                Ok(())
            }
            _ => Err(Error::invalid_transition(
                "bid is not in accepted state",
                self.status,
                Status::Withdrawn,
            )),
        }
    }
}

impl PolarClass for Bid {
    fn get_polar_class_builder() -> oso::ClassBuilder<Bid> {
        oso::Class::builder()
            .name("Bid")
            .add_attribute_getter("id", |recv: &Bid| recv.id.to_string())
            .add_attribute_getter("trip_id", |recv: &Bid| recv.trip_id.to_string())
            .add_attribute_getter("driver_id", |recv: &Bid| recv.driver_id.to_string())
            .add_attribute_getter("status", |recv: &Bid| recv.status.name().to_string())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Bid::get_polar_class_builder();
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid() -> Bid {
        Bid::new(Uuid::new_v4(), Uuid::new_v4(), 1800, Some("on my way".into()), Utc::now())
    }

    #[test]
    fn new_bid_is_submitted() {
        let bid = bid();
        assert_eq!(bid.status, Status::Submitted);
        assert_eq!(bid.message.as_deref(), Some("on my way"));
    }

    #[test]
    fn withdraw_only_from_submitted() {
        let mut bid = bid();
        bid.withdraw().unwrap();
        assert_eq!(bid.status, Status::Withdrawn);

        let err = bid.withdraw().unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(bid.status, Status::Withdrawn);
    }

    #[test]
    fn release_only_from_accepted() {
        let mut bid = bid();
        assert!(bid.release().is_err());

        bid.status = Status::Accepted;
        bid.release().unwrap();
        assert_eq!(bid.status, Status::Withdrawn);
    }

    #[test]
    fn request_validation() {
        let ok = BidRequest {
            amount: 1,
            message: None,
        };
        assert!(ok.validate().is_ok());

        let zero = BidRequest {
            amount: 0,
            message: None,
        };
        assert!(zero.validate().unwrap_err().is_validation());

        let long = BidRequest {
            amount: 100,
            message: Some("x".repeat(501)),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn view_flattens_the_bid() {
        let view = BidView {
            bid: bid(),
            driver: DriverContext {
                account_age_days: 3,
                completed_trip_count: 0,
                identity_verified: true,
                background_check_passed: false,
                vehicle_verified: false,
            },
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["amount"], 1800);
        assert_eq!(json["status"], "submitted");
        assert_eq!(json["driver"]["account_age_days"], 3);
        assert!(json.get("score").is_none());
    }
}
