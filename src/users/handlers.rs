use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use anyhow::Context;
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::{ApiJson, AppError, AppResult},
    state::AppState,
    users::{
        dto::{ChangePasswordRequest, MeResponse, PublicUser, UsersResponse},
        repo_types::User,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_me))
        .route("/users/me/password", patch(change_password))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<UsersResponse>> {
    let users = User::list(&state.db).await.context("list users")?;
    Ok(Json(UsersResponse {
        users: users.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .context("find user by id")?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(MeResponse {
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    services::change_password(&state, user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn me_response_serialization() {
        let response = MeResponse {
            user: PublicUser {
                id: uuid::Uuid::new_v4(),
                email: "test@example.com".to_string(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["email"], "test@example.com");
        assert!(json["user"].get("id").is_some());
    }

    #[test]
    fn user_summary_hides_secrets() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            is_verified: true,
            verification_token: "deadbeef".into(),
            verification_expires_at: time::OffsetDateTime::now_utc(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&crate::users::dto::UserSummary::from(user)).unwrap();
        assert!(json.contains("\"isVerified\":true"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("deadbeef"));
    }
}
