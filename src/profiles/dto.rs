use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::profiles::repo_types::{Profile, ProfileChanges};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailInfo {
    pub is_verified: bool,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub user: Uuid,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_image: Option<Uuid>,
    pub email_info: EmailInfo,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Profile> for ProfileView {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            user: p.user_id,
            display_name: p.display_name,
            bio: p.bio,
            avatar_image: p.avatar_image_id,
            email_info: EmailInfo {
                is_verified: p.email_verified,
                email: p.email,
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileView,
}

#[derive(Debug, Serialize)]
pub struct UpdatedProfileResponse {
    pub message: String,
    pub profile: ProfileView,
}

/// PATCH body; keys other than these are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub display_name: Option<String>,
    pub avatar_image: Option<Uuid>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            display_name: r.display_name,
            bio: r.bio,
            avatar_image_id: r.avatar_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_ignores_unknown_keys() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "bio": "lost my keys once",
            "user": "00000000-0000-0000-0000-000000000000",
            "emailInfo": { "isVerified": true }
        }))
        .unwrap();
        let changes = ProfileChanges::from(req);
        assert_eq!(changes.bio.as_deref(), Some("lost my keys once"));
        assert!(changes.display_name.is_none());
        assert!(changes.avatar_image_id.is_none());
    }

    #[test]
    fn empty_request_has_no_changes() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"createdAt": 1}"#).unwrap();
        assert!(ProfileChanges::from(req).is_empty());
    }

    #[test]
    fn view_uses_camel_case() {
        let now = OffsetDateTime::now_utc();
        let view = ProfileView::from(Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            display_name: Some("Ana".into()),
            bio: None,
            avatar_image_id: None,
            email: "ana@example.com".into(),
            email_verified: true,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["displayName"], "Ana");
        assert_eq!(json["emailInfo"]["isVerified"], true);
        assert!(json.get("avatarImage").is_some());
    }
}
