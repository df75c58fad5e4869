use anyhow::Context;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::{parse_id, ApiJson, AppError, AppResult},
    profiles::{
        dto::{ProfileResponse, UpdateProfileRequest, UpdatedProfileResponse},
        repo_types::Profile,
        services,
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_my_profile).patch(edit_profile))
        .route("/profile/:id", get(get_profile))
}

#[instrument(skip(state))]
pub async fn get_my_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let profile = services::profile_for_user(&state, user_id).await?;
    Ok(Json(ProfileResponse {
        profile: profile.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ProfileResponse>> {
    let id = parse_id(&id, "profile")?;
    let profile = Profile::find_by_id(&state.db, id)
        .await
        .context("find profile")?
        .ok_or_else(|| AppError::not_found("Profile not found"))?;
    Ok(Json(ProfileResponse {
        profile: profile.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn edit_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<UpdatedProfileResponse>> {
    let profile = services::edit_profile(&state, user_id, payload.into()).await?;
    Ok(Json(UpdatedProfileResponse {
        message: "Successfully updated".into(),
        profile: profile.into(),
    }))
}
