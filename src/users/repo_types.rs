use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub is_verified: bool,
    pub verification_token: String,
    pub verification_expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
