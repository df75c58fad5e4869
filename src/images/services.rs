use std::collections::HashMap;

use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

pub fn storage_key(author_id: Uuid, image_id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("images/{}/{}.{}", author_id, image_id, ext)
}

/// Stores the payload, then records the image row. The object is removed
/// again if the row cannot be written.
pub async fn upload_image(st: &AppState, author_id: Uuid, item: UploadItem) -> anyhow::Result<Uuid> {
    anyhow::ensure!(!item.body.is_empty(), "empty image");

    let id = Uuid::new_v4();
    let key = storage_key(author_id, id, &item.content_type);
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    if let Err(e) = repo::insert_image(&st.db, id, author_id, &item.content_type, &key).await {
        if let Err(cleanup) = st.storage.delete_object(&key).await {
            warn!(error = %cleanup, %key, "orphaned image object");
        }
        return Err(e);
    }

    info!(image_id = %id, %author_id, "image uploaded");
    Ok(id)
}

/// Content type and payload of an image, `None` when it does not exist.
pub async fn load_image(st: &AppState, id: Uuid) -> anyhow::Result<Option<(String, Bytes)>> {
    let Some(image) = repo::find_image(&st.db, id).await? else {
        return Ok(None);
    };
    let data = st
        .storage
        .get_object(&image.storage_key)
        .await
        .with_context(|| format!("get_object {}", image.storage_key))?;
    Ok(Some((image.content_type, data)))
}

/// Every requested image must exist and be authored by `requester`.
pub fn ensure_images_owned(
    requested: &[Uuid],
    found: &[(Uuid, Uuid)],
    requester: Uuid,
) -> AppResult<()> {
    let authors: HashMap<Uuid, Uuid> = found.iter().copied().collect();
    if requested.iter().all(|id| authors.get(id) == Some(&requester)) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Some of the specified imageIDs are not owned by the user",
        ))
    }
}

pub async fn check_images_owned(st: &AppState, requested: &[Uuid], requester: Uuid) -> AppResult<()> {
    if requested.is_empty() {
        return Ok(());
    }
    let found = repo::image_authors(&st.db, requested).await?;
    let checked = ensure_images_owned(requested, &found, requester);
    if checked.is_err() {
        warn!(user_id = %requester, "image ownership check failed");
    }
    checked
}

#[cfg(test)]
mod image_tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn storage_key_layout() {
        let user = Uuid::new_v4();
        let image = Uuid::new_v4();
        assert_eq!(
            storage_key(user, image, "image/png"),
            format!("images/{user}/{image}.png")
        );
        assert!(storage_key(user, image, "text/plain").ends_with(".bin"));
    }

    #[test]
    fn owned_images_pass() {
        let me = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(ensure_images_owned(&[a, b], &[(a, me), (b, me)], me).is_ok());
        assert!(ensure_images_owned(&[], &[], me).is_ok());
    }

    #[test]
    fn foreign_or_missing_images_are_forbidden() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let foreign = ensure_images_owned(&[a, b], &[(a, me), (b, other)], me);
        assert!(matches!(foreign, Err(AppError::Forbidden(_))));

        let missing = ensure_images_owned(&[a, b], &[(a, me)], me);
        assert!(matches!(missing, Err(AppError::Forbidden(_))));
    }
}
