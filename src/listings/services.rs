use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    images::services::check_images_owned,
    listings::{
        dto::{ListingView, UpdateListingRequest},
        filter::ListingFilter,
        repo_types::{ListingRow, NewListing},
    },
    profiles::services::profile_for_user,
    state::AppState,
};

/// Only the user behind the listing's poster profile may change it.
pub fn ensure_owner(listing: &ListingRow, requester: Uuid) -> AppResult<()> {
    if listing.poster_user_id == requester {
        Ok(())
    } else {
        Err(AppError::forbidden("Forbidden"))
    }
}

async fn load(st: &AppState, id: Uuid) -> AppResult<ListingRow> {
    ListingRow::find_by_id(&st.db, id)
        .await
        .context("find listing")?
        .ok_or_else(|| AppError::not_found("Listing not found"))
}

async fn load_owned(st: &AppState, id: Uuid, requester: Uuid) -> AppResult<ListingRow> {
    let listing = load(st, id).await?;
    if let Err(e) = ensure_owner(&listing, requester) {
        warn!(listing_id = %id, user_id = %requester, "listing owned by another user");
        return Err(e);
    }
    Ok(listing)
}

pub async fn search_listings(st: &AppState, filter: &ListingFilter) -> AppResult<Vec<ListingView>> {
    let rows = ListingRow::search(&st.db, filter)
        .await
        .context("search listings")?;
    let views = rows
        .into_iter()
        .map(ListingView::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(views)
}

pub async fn get_listing(st: &AppState, id: Uuid) -> AppResult<ListingView> {
    Ok(load(st, id).await?.try_into()?)
}

/// The poster is always the requester's own profile.
pub async fn create_listing(st: &AppState, user_id: Uuid, new: NewListing) -> AppResult<ListingView> {
    let profile = profile_for_user(st, user_id).await?;
    check_images_owned(st, &new.image_ids, user_id).await?;

    let id = ListingRow::insert(&st.db, profile.id, &new)
        .await
        .context("insert listing")?;
    info!(listing_id = %id, poster_id = %profile.id, "listing created");
    get_listing(st, id).await
}

pub async fn edit_listing(
    st: &AppState,
    id: Uuid,
    user_id: Uuid,
    request: UpdateListingRequest,
) -> AppResult<ListingView> {
    load_owned(st, id, user_id).await?;

    let changes = request.into_changes()?;
    if changes.is_empty() {
        return Err(AppError::bad_request("No fields were modifiable"));
    }
    if let Some(image_ids) = &changes.image_ids {
        check_images_owned(st, image_ids, user_id).await?;
    }

    ListingRow::update(&st.db, id, &changes)
        .await
        .context("update listing")?;
    info!(listing_id = %id, "listing updated");
    get_listing(st, id).await
}

/// Returns the listing as it was just before removal.
pub async fn delete_listing(st: &AppState, id: Uuid, user_id: Uuid) -> AppResult<ListingView> {
    let listing = load_owned(st, id, user_id).await?;
    let removed = ListingRow::delete(&st.db, id)
        .await
        .context("delete listing")?;
    if !removed {
        return Err(anyhow::anyhow!("listing {id} vanished before deletion").into());
    }
    info!(listing_id = %id, "listing deleted");
    Ok(listing.try_into()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn listing_posted_by(user_id: Uuid) -> ListingRow {
        let now = OffsetDateTime::now_utc();
        ListingRow {
            id: Uuid::new_v4(),
            title: "Lost umbrella".into(),
            description: "black".into(),
            longitude: 0.0,
            latitude: 0.0,
            location_name: None,
            poster_id: Uuid::new_v4(),
            kind: "LOST".into(),
            bounty: 0.0,
            tags: vec![],
            image_ids: vec![],
            resolved: false,
            created_at: now,
            updated_at: now,
            poster_user_id: user_id,
            poster_display_name: None,
            poster_bio: None,
            poster_avatar_image_id: None,
            poster_email: "u@example.com".into(),
            poster_email_verified: true,
            poster_created_at: now,
            poster_updated_at: now,
        }
    }

    #[test]
    fn owner_passes() {
        let me = Uuid::new_v4();
        assert!(ensure_owner(&listing_posted_by(me), me).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let listing = listing_posted_by(Uuid::new_v4());
        assert!(matches!(
            ensure_owner(&listing, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }
}
