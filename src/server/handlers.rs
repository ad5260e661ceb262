pub mod bids;
pub mod health;
pub mod members;
pub mod messages;
pub mod safety;
pub mod trips;
