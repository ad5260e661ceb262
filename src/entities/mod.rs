mod bid;
mod member;
mod message;
mod place;
mod safety;
mod trip;

pub use bid::{Bid, BidRequest, BidView, Status as BidStatus};
pub use member::{Attestation, BackgroundCheckStatus, DriverContext, Member, Role};
pub use message::Message;
pub use place::{Coordinates, Place};
pub use safety::{Block, Report, ReportRequest};
pub use trip::{Status as TripStatus, Trip, TripRequest, TRIP_TTL_HOURS};

#[cfg(test)]
pub(crate) use trip::tests::request as sample_trip_request;
