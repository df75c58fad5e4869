use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::profiles::repo_types::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingKind {
    Lost,
    Found,
}

impl ListingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Lost => "LOST",
            ListingKind::Found => "FOUND",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOST" => Some(ListingKind::Lost),
            "FOUND" => Some(ListingKind::Found),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub name: Option<String>,
}

/// Listing joined with its poster profile.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub longitude: f64,
    pub latitude: f64,
    pub location_name: Option<String>,
    pub poster_id: Uuid,
    pub kind: String,
    pub bounty: f64,
    pub tags: Vec<String>,
    pub image_ids: Vec<Uuid>,
    pub resolved: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub poster_user_id: Uuid,
    pub poster_display_name: Option<String>,
    pub poster_bio: Option<String>,
    pub poster_avatar_image_id: Option<Uuid>,
    pub poster_email: String,
    pub poster_email_verified: bool,
    pub poster_created_at: OffsetDateTime,
    pub poster_updated_at: OffsetDateTime,
}

impl ListingRow {
    pub fn poster(&self) -> Profile {
        Profile {
            id: self.poster_id,
            user_id: self.poster_user_id,
            display_name: self.poster_display_name.clone(),
            bio: self.poster_bio.clone(),
            avatar_image_id: self.poster_avatar_image_id,
            email: self.poster_email.clone(),
            email_verified: self.poster_email_verified,
            created_at: self.poster_created_at,
            updated_at: self.poster_updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub location: Location,
    pub kind: ListingKind,
    pub bounty: f64,
    pub tags: Vec<String>,
    pub image_ids: Vec<Uuid>,
}

/// Editable subset of a listing. Poster, kind and timestamps are not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub bounty: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub image_ids: Option<Vec<Uuid>>,
    pub resolved: Option<bool>,
}

impl ListingChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.bounty.is_none()
            && self.tags.is_none()
            && self.image_ids.is_none()
            && self.resolved.is_none()
    }
}
