use super::helpers::upsert_member;
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::MemberAPI,
    auth::Identity,
    entities::{Attestation, Member, Role},
    error::Error,
};

#[async_trait]
impl MemberAPI for Engine {
    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn register_member(&self, user: Identity) -> Result<Member, Error> {
        let mut tx = self.pool.begin().await?;

        let member = upsert_member(&mut tx, &user, Utc::now()).await?;

        tx.commit().await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user.id))]
    async fn find_member(&self, user: Identity) -> Result<Member, Error> {
        let Json(member): Json<Member> = self
            .pool
            .fetch_optional(sqlx::query("SELECT data FROM members WHERE id = $1").bind(&user.id))
            .await?
            .ok_or_else(|| Error::not_found("member"))?
            .try_get("data")?;

        Ok(member)
    }

    /// Called by verification providers, never through a member's own token.
    #[tracing::instrument(skip(self, attestation))]
    async fn record_verification(
        &self,
        driver_id: Uuid,
        attestation: Attestation,
    ) -> Result<Member, Error> {
        let mut tx = self.pool.begin().await?;

        let Json(mut member): Json<Member> = tx
            .fetch_optional(
                sqlx::query("SELECT data FROM members WHERE id = $1 FOR UPDATE").bind(&driver_id),
            )
            .await?
            .ok_or_else(|| Error::not_found("member"))?
            .try_get("data")?;

        if member.role != Role::Driver {
            return Err(Error::validation("verification applies to drivers only"));
        }

        member.apply(&attestation);

        tx.execute(
            sqlx::query("UPDATE members SET data = $2 WHERE id = $1")
                .bind(&member.id)
                .bind(Json(&member)),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(driver_id = %member.id, "verification recorded");

        Ok(member)
    }
}
