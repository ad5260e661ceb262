//! Periodic expiry of open trips that outlived their bidding window.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::api::TripAPI;

/// Runs until the runtime shuts down. A failed sweep is logged and retried on
/// the next tick.
pub fn spawn<T>(api: Arc<T>, every: Duration) -> JoinHandle<()>
where
    T: TripAPI + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(err) = api.expire_stale_trips().await {
                tracing::warn!(%err, "expiry sweep failed");
            }
        }
    })
}
