use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UploadedImageResponse {
    pub message: String,
    #[serde(rename = "imageID")]
    pub image_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MyImagesResponse {
    pub images: Vec<Uuid>,
}
