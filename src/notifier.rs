//! Fire-and-forget fan-out of trip changes to whoever is watching the trip.
//!
//! Publishing happens after the transaction commits and can never fail the
//! transition: with no subscribers the event is dropped, a subscriber that
//! falls behind skips events. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::entities::Trip;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripEvent {
    pub trip: Trip,
}

#[derive(Default)]
pub struct Notifier {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<TripEvent>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to changes of `trip`. A trip that can no longer change gets
    /// a receiver that is already closed. Channels whose subscribers have all
    /// gone are pruned on the way in.
    pub fn subscribe(&self, trip: &Trip) -> broadcast::Receiver<TripEvent> {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };

        channels.retain(|_, sender| sender.receiver_count() > 0);

        if trip.status.is_terminal() {
            return broadcast::channel(1).1;
        }

        channels
            .entry(trip.id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes the redacted record; the pickup code never leaves through
    /// this channel.
    pub fn publish(&self, trip: &Trip) {
        let mut channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(sender) = channels.get(&trip.id) else {
            tracing::debug!(trip_id = %trip.id, "no subscribers, dropping trip event");
            return;
        };

        let event = TripEvent {
            trip: trip.redacted(),
        };

        if sender.send(event).is_err() {
            tracing::debug!(trip_id = %trip.id, "all subscribers gone, dropping trip event");
            channels.remove(&trip.id);
            return;
        }

        // the stream ends for subscribers once the trip can no longer change
        if trip.status.is_terminal() {
            channels.remove(&trip.id);
        }
    }

    pub fn subscriber_count(&self, trip_id: &Uuid) -> usize {
        let channels = match self.channels.lock() {
            Ok(channels) => channels,
            Err(poisoned) => poisoned.into_inner(),
        };

        channels
            .get(trip_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    #[cfg(test)]
    fn channel_count(&self) -> usize {
        match self.channels.lock() {
            Ok(channels) => channels.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
