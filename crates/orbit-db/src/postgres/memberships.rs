//! Membership store — the one-row-per-(space, user) ledger.

use async_trait::async_trait;
use uuid::Uuid;

use orbit_common::models::{JoinStatus, MemberFilter, Membership, Page, SpaceRole};
use orbit_common::transitions::MemberState;

use crate::{Database, MembershipStore, NewMembership, PendingCount, StoreError};

#[async_trait]
impl MembershipStore for Database {
    async fn create_membership(
        &self,
        membership: NewMembership,
    ) -> Result<Membership, StoreError> {
        // A unique violation here means a concurrent join won the race; the
        // From<sqlx::Error> impl turns it into DuplicateMembership so the
        // service can re-fetch the winner.
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships
                (id, space_id, user_id, status, role, "left", removed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(membership.id)
        .bind(membership.space_id)
        .bind(membership.user_id)
        .bind(membership.status)
        .bind(membership.role)
        .fetch_one(tx.as_mut())
        .await
        .map_err(StoreError::from)?;

        // An open-space join lands directly on Approved and counts in the
        // same commit as the row itself.
        if created.is_active() {
            adjust_member_count(tx.as_mut(), created.space_id, 1).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_membership(&self, membership_id: Uuid) -> Result<Membership, StoreError> {
        sqlx::query_as::<_, Membership>("SELECT * FROM memberships WHERE id = $1")
            .bind(membership_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::MembershipNotFound)
    }

    async fn find_by_space_and_user(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE space_id = $1 AND user_id = $2",
        )
        .bind(space_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn update_state(
        &self,
        membership_id: Uuid,
        state: MemberState,
    ) -> Result<Membership, StoreError> {
        // One transaction: the row lock pins the before-state, so the
        // counter delta and the transition commit together or not at all.
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE id = $1 FOR UPDATE",
        )
        .bind(membership_id)
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or(StoreError::MembershipNotFound)?;

        let updated = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET status = $2, role = $3, "left" = $4, removed = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(membership_id)
        .bind(state.status)
        .bind(state.role)
        .bind(state.left)
        .bind(state.removed)
        .fetch_one(tx.as_mut())
        .await?;

        let delta = i32::from(updated.is_active()) - i32::from(before.is_active());
        if delta != 0 {
            adjust_member_count(tx.as_mut(), before.space_id, delta).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn set_external_member_ref(
        &self,
        membership_id: Uuid,
        member_ref: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE memberships SET external_member_ref = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(membership_id)
        .bind(member_ref)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MembershipNotFound);
        }
        Ok(())
    }

    async fn list_members(
        &self,
        space_id: Uuid,
        filter: MemberFilter,
        page: Page,
    ) -> Result<Vec<Membership>, StoreError> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT * FROM memberships
            WHERE space_id = $1
              AND ($2::join_status IS NULL OR status = $2)
              AND ($3::space_role IS NULL OR role = $3)
              AND (NOT $4 OR (NOT "left" AND NOT removed))
            ORDER BY created_at
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(space_id)
        .bind(filter.status)
        .bind(filter.role)
        .bind(filter.active_only)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn count_active_members(&self, space_id: Uuid) -> Result<i64, StoreError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE space_id = $1 AND status = $2 AND NOT "left" AND NOT removed
            "#,
        )
        .bind(space_id)
        .bind(JoinStatus::Approved)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn count_active_admins(&self, space_id: Uuid) -> Result<i64, StoreError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE space_id = $1 AND status = $2 AND role = $3 AND NOT "left" AND NOT removed
            "#,
        )
        .bind(space_id)
        .bind(JoinStatus::Approved)
        .bind(SpaceRole::Admin)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from)
    }

    async fn count_pending(&self, space_ids: &[Uuid]) -> Result<Vec<PendingCount>, StoreError> {
        // One grouped query for the whole badge row — no per-space N+1.
        sqlx::query_as::<_, PendingCount>(
            r#"
            SELECT space_id, COUNT(*) AS pending
            FROM memberships
            WHERE space_id = ANY($1) AND status = $2 AND NOT "left" AND NOT removed
            GROUP BY space_id
            "#,
        )
        .bind(space_ids)
        .bind(JoinStatus::Pending)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)
    }
}

/// Move the denormalized counter inside the caller's transaction.
async fn adjust_member_count(
    conn: &mut sqlx::PgConnection,
    space_id: Uuid,
    delta: i32,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE spaces SET member_count = GREATEST(member_count + $2, 0) WHERE id = $1")
        .bind(space_id)
        .bind(delta)
        .execute(conn)
        .await?;
    Ok(())
}
