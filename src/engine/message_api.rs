use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::MessageAPI,
    auth::Identity,
    entities::{Message, TripStatus},
    error::Error,
};

#[async_trait]
impl MessageAPI for Engine {
    #[tracing::instrument(skip(self, body), fields(user_id = %user.id))]
    async fn send_message(
        &self,
        user: Identity,
        trip_id: Uuid,
        body: String,
    ) -> Result<Message, Error> {
        let trip = self.fetch_trip(&trip_id).await?;

        self.authorize(user.clone(), "message", trip.clone())?;

        if trip.driver_id.is_none() {
            return Err(Error::invalid_transition(
                "messages open once a bid is accepted",
                trip.status,
                TripStatus::Accepted,
            ));
        }

        let message = Message::new(trip.id, user.id, user.role, &body, Utc::now())?;

        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO messages (id, trip_id, created_at, data) VALUES ($1, $2, $3, $4)",
                )
                .bind(&message.id)
                .bind(&message.trip_id)
                .bind(&message.created_at)
                .bind(Json(&message)),
            )
            .await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn list_messages(&self, user: Identity, trip_id: Uuid) -> Result<Vec<Message>, Error> {
        let trip = self.fetch_trip(&trip_id).await?;

        self.authorize(user, "message", trip.clone())?;

        let rows = self
            .pool
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM messages WHERE trip_id = $1 ORDER BY created_at ASC, id ASC",
                )
                .bind(&trip.id),
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<Message, Error> {
                let Json(message): Json<Message> = row.try_get("data")?;
                Ok(message)
            })
            .collect()
    }
}
