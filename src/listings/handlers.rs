use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::{parse_id, ApiJson, AppResult},
    listings::{
        dto::{
            CreateListingRequest, DeletedListingResponse, ListingResponse, ListingsResponse,
            UpdateListingRequest, UpdatedListingResponse,
        },
        filter::ListingFilter,
        services,
    },
    state::AppState,
};

pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(search_listings).post(create_listing))
        .route(
            "/listings/:id",
            get(get_listing).patch(edit_listing).delete(delete_listing),
        )
}

/// GET /listings?search=&type=&tags=&datelt=&dategt=&bountylt=&bountygt=&longitude=&latitude=&radius=&author=&sortBy=
#[instrument(skip(state))]
pub async fn search_listings(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<ListingsResponse>> {
    let filter = ListingFilter::from_query(query.as_deref().unwrap_or_default())?;
    let listings = services::search_listings(&state, &filter).await?;
    Ok(Json(ListingsResponse { listings }))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ListingResponse>> {
    let id = parse_id(&id, "listing")?;
    let listing = services::get_listing(&state, id).await?;
    Ok(Json(ListingResponse { listing }))
}

#[instrument(skip(state, payload))]
pub async fn create_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateListingRequest>,
) -> AppResult<(StatusCode, Json<ListingResponse>)> {
    let new = payload.into_new_listing()?;
    let listing = services::create_listing(&state, user_id, new).await?;
    Ok((StatusCode::CREATED, Json(ListingResponse { listing })))
}

#[instrument(skip(state, payload))]
pub async fn edit_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateListingRequest>,
) -> AppResult<Json<UpdatedListingResponse>> {
    let id = parse_id(&id, "listing")?;
    let listing = services::edit_listing(&state, id, user_id, payload).await?;
    Ok(Json(UpdatedListingResponse {
        message: "Successfully updated".into(),
        listing,
    }))
}

#[instrument(skip(state))]
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DeletedListingResponse>> {
    let id = parse_id(&id, "listing")?;
    let deleted_listing = services::delete_listing(&state, id, user_id).await?;
    Ok(Json(DeletedListingResponse { deleted_listing }))
}
