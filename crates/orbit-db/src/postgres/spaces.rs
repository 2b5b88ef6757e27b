//! Space store — CRUD over the authoritative space rows.

use async_trait::async_trait;
use uuid::Uuid;

use orbit_common::models::{
    JoinStatus, Membership, Space, SpaceRole, UpdateSpaceRequest,
};

use crate::{Database, NewSpace, SpaceStore, StoreError};

#[async_trait]
impl SpaceStore for Database {
    async fn find_space(&self, space_id: Uuid) -> Result<Space, StoreError> {
        sqlx::query_as::<_, Space>("SELECT * FROM spaces WHERE id = $1")
            .bind(space_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::SpaceNotFound)
    }

    async fn create_space_with_owner(
        &self,
        space: NewSpace,
        owner_membership_id: Uuid,
    ) -> Result<(Space, Membership), StoreError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Space>(
            r#"
            INSERT INTO spaces
                (id, title, description, visibility, auto_approval, active, owner_id,
                 member_count, like_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, 1, 0, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(space.id)
        .bind(&space.title)
        .bind(&space.description)
        .bind(space.visibility)
        .bind(space.auto_approval)
        .bind(space.owner_id)
        .fetch_one(tx.as_mut())
        .await?;

        let owner = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships
                (id, space_id, user_id, status, role, "left", removed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(owner_membership_id)
        .bind(space.id)
        .bind(space.owner_id)
        .bind(JoinStatus::Approved)
        .bind(SpaceRole::Admin)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;
        Ok((created, owner))
    }

    async fn update_space(
        &self,
        space_id: Uuid,
        patch: &UpdateSpaceRequest,
    ) -> Result<Space, StoreError> {
        sqlx::query_as::<_, Space>(
            r#"
            UPDATE spaces SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                visibility = COALESCE($4, visibility),
                auto_approval = COALESCE($5, auto_approval),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(space_id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.visibility)
        .bind(patch.auto_approval)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::SpaceNotFound)
    }

    async fn deactivate_space(&self, space_id: Uuid) -> Result<Space, StoreError> {
        sqlx::query_as::<_, Space>(
            "UPDATE spaces SET active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::SpaceNotFound)
    }

    async fn set_external_refs(
        &self,
        space_id: Uuid,
        external_id: &str,
        external_uri: Option<&str>,
    ) -> Result<(), StoreError> {
        // Append-once: the guard keeps a second creation sync from
        // overwriting provider identifiers.
        let result = sqlx::query(
            r#"
            UPDATE spaces
            SET external_id = $2, external_uri = $3, updated_at = NOW()
            WHERE id = $1 AND external_id IS NULL
            "#,
        )
        .bind(space_id)
        .bind(external_id)
        .bind(external_uri)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM spaces WHERE id = $1)")
                    .bind(space_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(StoreError::SpaceNotFound);
            }
            return Err(StoreError::ExternalIdAlreadySet);
        }
        Ok(())
    }
}
