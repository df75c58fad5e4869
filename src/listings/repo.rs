use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::listings::{
    filter::ListingFilter,
    repo_types::{ListingChanges, ListingRow, NewListing},
};

const LISTING_SELECT: &str = "SELECT l.id, l.title, l.description, l.longitude, l.latitude, \
    l.location_name, l.poster_id, l.kind, l.bounty, l.tags, l.image_ids, l.resolved, \
    l.created_at, l.updated_at, \
    p.user_id AS poster_user_id, p.display_name AS poster_display_name, p.bio AS poster_bio, \
    p.avatar_image_id AS poster_avatar_image_id, p.email AS poster_email, \
    p.email_verified AS poster_email_verified, p.created_at AS poster_created_at, \
    p.updated_at AS poster_updated_at \
    FROM listings l JOIN profiles p ON p.id = l.poster_id";

fn search_query(filter: &ListingFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(LISTING_SELECT);
    filter.push_where(&mut qb);
    filter.push_order(&mut qb);
    qb
}

impl ListingRow {
    pub async fn search(db: &PgPool, filter: &ListingFilter) -> sqlx::Result<Vec<ListingRow>> {
        let mut qb = search_query(filter);
        qb.build_query_as::<ListingRow>().fetch_all(db).await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<ListingRow>> {
        sqlx::query_as::<_, ListingRow>(&format!("{LISTING_SELECT} WHERE l.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert(db: &PgPool, poster_id: Uuid, new: &NewListing) -> sqlx::Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO listings
                (title, description, longitude, latitude, location_name,
                 poster_id, kind, bounty, tags, image_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.location.longitude)
        .bind(new.location.latitude)
        .bind(&new.location.name)
        .bind(poster_id)
        .bind(new.kind.as_str())
        .bind(new.bounty)
        .bind(&new.tags)
        .bind(&new.image_ids)
        .fetch_one(db)
        .await
    }

    pub async fn update(db: &PgPool, id: Uuid, changes: &ListingChanges) -> sqlx::Result<()> {
        let mut qb = update_query(id, changes);
        qb.build().execute(db).await?;
        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let done = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

fn update_query(id: Uuid, changes: &ListingChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE listings SET updated_at = now()");
    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(description) = &changes.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(location) = &changes.location {
        qb.push(", longitude = ")
            .push_bind(location.longitude)
            .push(", latitude = ")
            .push_bind(location.latitude)
            .push(", location_name = ")
            .push_bind(location.name.clone());
    }
    if let Some(bounty) = changes.bounty {
        qb.push(", bounty = ").push_bind(bounty);
    }
    if let Some(tags) = &changes.tags {
        qb.push(", tags = ").push_bind(tags.clone());
    }
    if let Some(image_ids) = &changes.image_ids {
        qb.push(", image_ids = ").push_bind(image_ids.clone());
    }
    if let Some(resolved) = changes.resolved {
        qb.push(", resolved = ").push_bind(resolved);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_joins_poster_profile() {
        let qb = search_query(&ListingFilter::default());
        let sql = qb.sql();
        assert!(sql.contains("FROM listings l JOIN profiles p ON p.id = l.poster_id WHERE TRUE"));
        assert!(sql.ends_with("ORDER BY l.created_at ASC, l.id ASC"));
    }

    #[test]
    fn update_never_touches_poster_or_kind() {
        let changes = ListingChanges {
            title: Some("new".into()),
            resolved: Some(true),
            ..Default::default()
        };
        let qb = update_query(Uuid::new_v4(), &changes);
        assert_eq!(
            qb.sql(),
            "UPDATE listings SET updated_at = now(), title = $1, resolved = $2 WHERE id = $3"
        );
    }
}
