use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::password::{ensure_acceptable, hash_password, verify_password},
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::User,
};

pub async fn change_password(
    st: &AppState,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    ensure_acceptable(new_password)?;

    let user = User::find_by_id(&st.db, user_id)
        .await
        .context("find user by id")?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(AppError::Unauthorized("Incorrect password.".into()));
    }

    let hash = hash_password(new_password)?;
    User::update_password(&st.db, user.id, &hash)
        .await
        .context("update password")?;
    info!(user_id = %user.id, "password changed");
    Ok(())
}
