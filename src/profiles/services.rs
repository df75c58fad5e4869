use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    images::repo::find_image,
    profiles::repo_types::{Profile, ProfileChanges},
    state::AppState,
};

pub async fn profile_for_user(st: &AppState, user_id: Uuid) -> AppResult<Profile> {
    Profile::find_by_user_id(&st.db, user_id)
        .await
        .context("find profile by user")?
        .ok_or_else(|| AppError::not_found("Profile not found for user"))
}

pub async fn edit_profile(st: &AppState, user_id: Uuid, changes: ProfileChanges) -> AppResult<Profile> {
    let profile = profile_for_user(st, user_id).await?;

    if changes.is_empty() {
        return Err(AppError::bad_request("None of the fields were modifiable"));
    }

    if let Some(avatar_id) = changes.avatar_image_id {
        let image = find_image(&st.db, avatar_id)
            .await?
            .ok_or_else(|| AppError::bad_request("avatarImage does not exist"))?;
        if image.author_id != user_id {
            warn!(%user_id, image_id = %avatar_id, "avatar image owned by another user");
            return Err(AppError::forbidden("avatarImage is not owned by the user"));
        }
    }

    let updated = Profile::update(&st.db, profile.id, &changes)
        .await
        .context("update profile")?;
    info!(profile_id = %updated.id, "profile updated");
    Ok(updated)
}
