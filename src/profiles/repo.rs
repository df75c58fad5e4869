use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::profiles::repo_types::{Profile, ProfileChanges};

const PROFILE_COLUMNS: &str = "id, user_id, display_name, bio, avatar_image_id, email, \
                               email_verified, created_at, updated_at";

impl Profile {
    pub async fn create_for_user_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        email: &str,
    ) -> sqlx::Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profiles (user_id, email, email_verified) VALUES ($1, $2, FALSE) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(email)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn mark_email_verified_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE profiles SET email_verified = TRUE, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Applies the present fields of `changes` and returns the new row.
    pub async fn update(db: &PgPool, id: Uuid, changes: &ProfileChanges) -> sqlx::Result<Profile> {
        let mut qb = update_query(id, changes);
        qb.build_query_as::<Profile>().fetch_one(db).await
    }
}

fn update_query(id: Uuid, changes: &ProfileChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE profiles SET updated_at = now()");
    if let Some(display_name) = &changes.display_name {
        qb.push(", display_name = ").push_bind(display_name.clone());
    }
    if let Some(bio) = &changes.bio {
        qb.push(", bio = ").push_bind(bio.clone());
    }
    if let Some(avatar) = changes.avatar_image_id {
        qb.push(", avatar_image_id = ").push_bind(avatar);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(PROFILE_COLUMNS);
    qb
}
