use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

const MAX_REASON_LENGTH: usize = 1000;

/// `blocker_id` no longer sees trips or bids from `blocked_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn new(blocker_id: Uuid, blocked_id: Uuid, now: DateTime<Utc>) -> Result<Self, Error> {
        if blocker_id == blocked_id {
            return Err(Error::validation("cannot block yourself"));
        }

        Ok(Self {
            blocker_id,
            blocked_id,
            created_at: now,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportRequest {
    pub reported_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(reporter_id: Uuid, request: ReportRequest, now: DateTime<Utc>) -> Result<Self, Error> {
        let reason = request.reason.trim().to_string();

        if reason.is_empty() {
            return Err(Error::validation("report reason is required"));
        }
        if reason.chars().count() > MAX_REASON_LENGTH {
            return Err(Error::validation(format!(
                "report reason must be at most {} characters",
                MAX_REASON_LENGTH
            )));
        }
        if reporter_id == request.reported_id {
            return Err(Error::validation("cannot report yourself"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            reporter_id,
            reported_id: request.reported_id,
            trip_id: request.trip_id,
            reason,
            created_at: now,
        })
    }
}
