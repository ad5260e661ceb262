use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::SafetyAPI,
    auth::Identity,
    entities::{Block, Report, ReportRequest},
    error::Error,
};

#[async_trait]
impl SafetyAPI for Engine {
    /// Idempotent. Blocking only narrows what the blocker sees.
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn block(&self, user: Identity, target_id: Uuid) -> Result<Block, Error> {
        let block = Block::new(user.id, target_id, Utc::now())?;

        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO blocks (blocker_id, blocked_id, created_at) VALUES ($1, $2, $3)
                     ON CONFLICT (blocker_id, blocked_id) DO NOTHING",
                )
                .bind(&block.blocker_id)
                .bind(&block.blocked_id)
                .bind(&block.created_at),
            )
            .await?;

        Ok(block)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn unblock(&self, user: Identity, target_id: Uuid) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
                    .bind(&user.id)
                    .bind(&target_id),
            )
            .await?;

        Ok(())
    }

    async fn is_blocked(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<bool, Error> {
        let blocked: bool = self
            .pool
            .fetch_one(
                sqlx::query(
                    "SELECT EXISTS (
                         SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2
                     ) AS blocked",
                )
                .bind(&blocker_id)
                .bind(&blocked_id),
            )
            .await?
            .try_get("blocked")?;

        Ok(blocked)
    }

    #[tracing::instrument(skip(self, request), fields(user_id = %user.id))]
    async fn report(&self, user: Identity, request: ReportRequest) -> Result<Report, Error> {
        let report = Report::new(user.id, request, Utc::now())?;

        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO reports (id, reporter_id, reported_id, created_at, data)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(&report.id)
                .bind(&report.reporter_id)
                .bind(&report.reported_id)
                .bind(&report.created_at)
                .bind(Json(&report)),
            )
            .await?;

        tracing::info!(report_id = %report.id, reported_id = %report.reported_id, "report filed");

        Ok(report)
    }
}
