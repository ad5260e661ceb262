mod bid_api;
mod helpers;
mod member_api;
mod message_api;
mod safety_api;
mod trip_api;

use async_trait::async_trait;
use oso::Oso;
use sqlx::{Executor, Pool, Postgres};

use crate::{
    api::{HealthAPI, API},
    auth::authorizor,
    error::Error,
    notifier::Notifier,
};

type Database = Postgres;

const MIGRATION_LOCK: i64 = 0x7269_6465;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS members (id UUID PRIMARY KEY, role VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS trips (id UUID PRIMARY KEY, rider_id UUID NOT NULL, driver_id UUID, status VARCHAR NOT NULL, expires_at TIMESTAMPTZ NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS trips_status_expires_at ON trips (status, expires_at)",
    "CREATE INDEX IF NOT EXISTS trips_rider_id ON trips (rider_id, created_at)",
    "CREATE INDEX IF NOT EXISTS trips_driver_id ON trips (driver_id, status)",
    "CREATE TABLE IF NOT EXISTS bids (id UUID PRIMARY KEY, trip_id UUID NOT NULL REFERENCES trips(id), driver_id UUID NOT NULL, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS bids_trip_id ON bids (trip_id, created_at)",
    "CREATE INDEX IF NOT EXISTS bids_driver_id ON bids (driver_id, created_at)",
    // a driver holds at most one live bid per trip
    "CREATE UNIQUE INDEX IF NOT EXISTS bids_one_submitted_per_driver ON bids (trip_id, driver_id) WHERE status = 'submitted'",
    "CREATE TABLE IF NOT EXISTS blocks (blocker_id UUID NOT NULL, blocked_id UUID NOT NULL, created_at TIMESTAMPTZ NOT NULL, PRIMARY KEY (blocker_id, blocked_id))",
    "CREATE TABLE IF NOT EXISTS reports (id UUID PRIMARY KEY, reporter_id UUID NOT NULL, reported_id UUID NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS messages (id UUID PRIMARY KEY, trip_id UUID NOT NULL REFERENCES trips(id), created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
    "CREATE INDEX IF NOT EXISTS messages_trip_id ON messages (trip_id, created_at)",
];

pub struct Engine {
    pool: Pool<Database>,
    authorizor: Oso,
    notifier: Notifier,
}

impl Engine {
    /// Does not touch the database; call [`Engine::migrate`] before serving.
    pub fn new(pool: Pool<Database>) -> Result<Self, Error> {
        Ok(Self {
            pool,
            authorizor: authorizor::new()?,
            notifier: Notifier::new(),
        })
    }

    /// Serialized across processes by an advisory lock held for the
    /// transaction.
    #[tracing::instrument(name = "Engine::migrate", skip_all)]
    pub async fn migrate(&self) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        tx.execute(sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(MIGRATION_LOCK))
            .await?;

        for statement in SCHEMA {
            tx.execute(*statement).await?;
        }

        tx.commit().await?;

        tracing::info!("schema is up to date");

        Ok(())
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar + std::fmt::Display + Copy,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::forbidden(format!("not allowed to {}", action)))
    }
}

#[async_trait]
impl HealthAPI for Engine {
    async fn check_health(&self) -> Result<(), Error> {
        self.pool.execute("SELECT 1").await?;
        Ok(())
    }
}

impl API for Engine {}
