use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Image metadata; the payload lives in object storage under `storage_key`.
#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content_type: String,
    pub storage_key: String,
    pub created_at: OffsetDateTime,
}
