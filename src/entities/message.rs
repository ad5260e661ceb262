use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Role;
use crate::error::Error;

const MAX_BODY_LENGTH: usize = 1000;

/// Text exchanged between the rider and the accepted driver of a trip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub sender_id: Uuid,
    pub sender_role: Role,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        trip_id: Uuid,
        sender_id: Uuid,
        sender_role: Role,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let body = body.trim();

        if body.is_empty() {
            return Err(Error::validation("message body is required"));
        }
        if body.chars().count() > MAX_BODY_LENGTH {
            return Err(Error::validation(format!(
                "message body must be at most {} characters",
                MAX_BODY_LENGTH
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            trip_id,
            sender_id,
            sender_role,
            body: body.to_string(),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_validated() {
        let new = |body: &str| {
            Message::new(Uuid::new_v4(), Uuid::new_v4(), Role::Rider, body, Utc::now())
        };

        assert!(new("").is_err());
        assert!(new(&"a".repeat(1001)).is_err());
        assert_eq!(new(" at the gate ").unwrap().body, "at the gate");
    }
}
