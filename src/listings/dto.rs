use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    listings::repo_types::{ListingChanges, ListingKind, ListingRow, Location, NewListing},
    profiles::dto::ProfileView,
};

/// `coords` is `[longitude, latitude]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationBody {
    pub coords: Option<Vec<f64>>,
    pub name: Option<String>,
}

impl LocationBody {
    fn into_location(self) -> AppResult<Location> {
        let coords = self
            .coords
            .ok_or_else(|| AppError::MissingFields(vec!["location.coords".into()]))?;
        let [longitude, latitude] = coords[..] else {
            return Err(AppError::bad_request(
                "location.coords must be [longitude, latitude]",
            ));
        };
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::bad_request("location.coords out of range"));
        }
        Ok(Location {
            longitude,
            latitude,
            name: self.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationView {
    pub coords: [f64; 2],
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: LocationView,
    pub poster: ProfileView,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub bounty: f64,
    pub tags: Vec<String>,
    #[serde(rename = "imageIDs")]
    pub image_ids: Vec<Uuid>,
    pub resolved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ListingRow> for ListingView {
    type Error = anyhow::Error;

    fn try_from(row: ListingRow) -> anyhow::Result<Self> {
        let kind = ListingKind::parse(&row.kind)
            .ok_or_else(|| anyhow::anyhow!("listing {} has unknown kind {:?}", row.id, row.kind))?;
        let poster = row.poster().into();
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            location: LocationView {
                coords: [row.longitude, row.latitude],
                name: row.location_name,
            },
            poster,
            kind,
            bounty: row.bounty,
            tags: row.tags,
            image_ids: row.image_ids,
            resolved: row.resolved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(AppError::BadRequest(format!("{field} must not be empty"))),
        None => Err(AppError::MissingFields(vec![field.into()])),
    }
}

fn valid_bounty(bounty: f64) -> AppResult<f64> {
    if bounty.is_finite() && bounty >= 0.0 {
        Ok(bounty)
    } else {
        Err(AppError::bad_request("bounty must be a non-negative number"))
    }
}

/// Trims, drops blanks and removes duplicates, keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn dedupe_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<LocationBody>,
    pub bounty: Option<f64>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "imageIDs")]
    pub image_ids: Option<Vec<Uuid>>,
}

impl CreateListingRequest {
    pub fn into_new_listing(self) -> AppResult<NewListing> {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push("title".to_string());
        }
        if self.description.is_none() {
            missing.push("description".to_string());
        }
        if self.kind.is_none() {
            missing.push("type".to_string());
        }
        match &self.location {
            None => missing.push("location".to_string()),
            Some(loc) if loc.coords.is_none() => missing.push("location.coords".to_string()),
            Some(_) => {}
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let kind = self.kind.as_deref().and_then(ListingKind::parse).ok_or_else(|| {
            AppError::bad_request("Invalid type. Use \"LOST\" or \"FOUND\"")
        })?;

        Ok(NewListing {
            title: required_text(self.title, "title")?,
            description: required_text(self.description, "description")?,
            location: self.location.unwrap_or_default().into_location()?,
            kind,
            bounty: valid_bounty(self.bounty.unwrap_or(0.0))?,
            tags: normalize_tags(self.tags.unwrap_or_default()),
            image_ids: dedupe_ids(self.image_ids.unwrap_or_default()),
        })
    }
}

/// PATCH body; only these keys can change, anything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<LocationBody>,
    pub bounty: Option<f64>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "imageIDs")]
    pub image_ids: Option<Vec<Uuid>>,
    pub resolved: Option<bool>,
}

impl UpdateListingRequest {
    pub fn into_changes(self) -> AppResult<ListingChanges> {
        Ok(ListingChanges {
            title: self.title.map(|t| required_text(Some(t), "title")).transpose()?,
            description: self
                .description
                .map(|d| required_text(Some(d), "description"))
                .transpose()?,
            location: self.location.map(LocationBody::into_location).transpose()?,
            bounty: self.bounty.map(valid_bounty).transpose()?,
            tags: self.tags.map(normalize_tags),
            image_ids: self.image_ids.map(dedupe_ids),
            resolved: self.resolved,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub listings: Vec<ListingView>,
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub listing: ListingView,
}

#[derive(Debug, Serialize)]
pub struct UpdatedListingResponse {
    pub message: String,
    pub listing: ListingView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedListingResponse {
    pub deleted_listing: ListingView,
}
