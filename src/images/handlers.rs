use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{MyImagesResponse, UploadedImageResponse},
    repo,
    services::{load_image, upload_image, UploadItem},
};
use crate::{
    auth::jwt::AuthUser,
    error::{parse_id, AppError, AppResult},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/image/mine", get(my_images))
        .route("/image/:id", get(get_image))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/image", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /image (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<UploadedImageResponse>> {
    let mut item = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(AppError::bad_request("Malformed multipart body"));
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("Could not read image: {e}")))?;
        item = Some(UploadItem { body, content_type });
        break;
    }

    let item = match item {
        Some(i) if !i.body.is_empty() => i,
        _ => return Err(AppError::bad_request("Upload requires image")),
    };

    let image_id = upload_image(&state, user_id, item).await?;
    Ok(Json(UploadedImageResponse {
        message: "Successfully uploaded image".into(),
        image_id,
    }))
}

#[instrument(skip(state))]
pub async fn my_images(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MyImagesResponse>> {
    let images = repo::list_image_ids_by_author(&state.db, user_id).await?;
    Ok(Json(MyImagesResponse { images }))
}

/// Raw image bytes with their stored content type.
#[instrument(skip(state))]
pub async fn get_image(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let id = parse_id(&id, "image")?;
    let (content_type, data) = load_image(&state, id)
        .await?
        .ok_or_else(|| AppError::not_found("Image not found"))?;
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}
