use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::images::repo_types::Image;

pub async fn insert_image(
    db: &PgPool,
    id: Uuid,
    author_id: Uuid,
    content_type: &str,
    storage_key: &str,
) -> anyhow::Result<Image> {
    let image = sqlx::query_as::<_, Image>(
        r#"
        INSERT INTO images (id, author_id, content_type, storage_key)
        VALUES ($1, $2, $3, $4)
        RETURNING id, author_id, content_type, storage_key, created_at
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(content_type)
    .bind(storage_key)
    .fetch_one(db)
    .await
    .context("insert image")?;
    Ok(image)
}

pub async fn find_image(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Image>> {
    let image = sqlx::query_as::<_, Image>(
        r#"
        SELECT id, author_id, content_type, storage_key, created_at
          FROM images
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find image")?;
    Ok(image)
}

/// IDs of all images uploaded by `author_id`, oldest first.
pub async fn list_image_ids_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
          FROM images
         WHERE author_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(author_id)
    .fetch_all(db)
    .await
    .context("list images by author")?;
    Ok(ids)
}

/// (image id, author id) for every existing id in `ids`.
pub async fn image_authors(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<(Uuid, Uuid)>> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
        r#"
        SELECT id, author_id
          FROM images
         WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(db)
    .await
    .context("load image authors")?;
    Ok(rows)
}
