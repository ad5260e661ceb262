pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod error;
pub mod notifier;
pub mod pickup_code;
pub mod server;

pub mod sweeper;
