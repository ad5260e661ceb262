use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Rider,
    Driver,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCheckStatus {
    NotStarted,
    Pending,
    Passed,
    Failed,
}

/// Account record. Verification flags are written by external attestation
/// services and only ever read by the marketplace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub role: Role,
    pub email_verified: bool,
    pub identity_verified: bool,
    pub background_check_status: BackgroundCheckStatus,
    pub vehicle_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Result reported by a verification provider. Absent fields are left as
/// they are.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attestation {
    pub identity_verified: Option<bool>,
    pub background_check_status: Option<BackgroundCheckStatus>,
    pub vehicle_verified: Option<bool>,
}

/// Facts shown next to a bid. Deliberately no derived score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverContext {
    pub account_age_days: i64,
    pub completed_trip_count: i64,
    pub identity_verified: bool,
    pub background_check_passed: bool,
    pub vehicle_verified: bool,
}

impl Member {
    pub fn new(id: Uuid, role: Role, email_verified: bool, now: DateTime<Utc>) -> Self {
        Self {
            id,
            role,
            email_verified,
            identity_verified: false,
            background_check_status: BackgroundCheckStatus::NotStarted,
            vehicle_verified: false,
            created_at: now,
        }
    }

    pub fn apply(&mut self, attestation: &Attestation) {
        if let Some(identity_verified) = attestation.identity_verified {
            self.identity_verified = identity_verified;
        }
        if let Some(status) = attestation.background_check_status {
            self.background_check_status = status;
        }
        if let Some(vehicle_verified) = attestation.vehicle_verified {
            self.vehicle_verified = vehicle_verified;
        }
    }

    pub fn driver_context(&self, completed_trip_count: i64, now: DateTime<Utc>) -> DriverContext {
        DriverContext {
            account_age_days: (now - self.created_at).num_days().max(0),
            completed_trip_count,
            identity_verified: self.identity_verified,
            background_check_passed: self.background_check_status
                == BackgroundCheckStatus::Passed,
            vehicle_verified: self.vehicle_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn attestation_updates_only_reported_fields() {
        let mut member = Member::new(Uuid::new_v4(), Role::Driver, true, Utc::now());
        member.apply(&Attestation {
            identity_verified: Some(true),
            ..Default::default()
        });
        member.apply(&Attestation {
            background_check_status: Some(BackgroundCheckStatus::Passed),
            ..Default::default()
        });

        assert!(member.identity_verified);
        assert_eq!(member.background_check_status, BackgroundCheckStatus::Passed);
        assert!(!member.vehicle_verified);
    }

    #[test]
    fn driver_context_reports_account_age() {
        let now = Utc::now();
        let member = Member::new(Uuid::new_v4(), Role::Driver, true, now - Duration::days(40));

        let context = member.driver_context(7, now);
        assert_eq!(
            context,
            DriverContext {
                account_age_days: 40,
                completed_trip_count: 7,
                identity_verified: false,
                background_check_passed: false,
                vehicle_verified: false,
            }
        );
    }

    #[test]
    fn pending_background_check_is_not_passed() {
        let now = Utc::now();
        let mut member = Member::new(Uuid::new_v4(), Role::Driver, true, now);
        member.background_check_status = BackgroundCheckStatus::Pending;
        assert!(!member.driver_context(0, now).background_check_passed);
    }
}
