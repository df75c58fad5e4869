use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use tracing::instrument;

use crate::{
    auth::{
        dto::{Credentials, LoginResponse, ResendRequest, SignupResponse, VerifyQuery},
        services,
    },
    error::{ApiJson, AppError, AppResult},
    state::AppState,
    users::dto::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify_email))
        .route("/auth/verify/resend", post(resend_verification))
}

fn required_credentials(payload: Credentials) -> AppResult<(String, String)> {
    payload
        .normalized()
        .ok_or_else(|| AppError::bad_request("Fields email and password are required"))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let (email, password) = required_credentials(payload)?;
    let user = services::signup(&state, &email, &password).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: PublicUser::from(&user),
            message: "Signup successful; Please verify your email.".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Credentials>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let (email, password) = required_credentials(payload)?;
    let token = services::login(&state, &email, &password).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).context("authorization header")?,
    );
    Ok((
        headers,
        Json(LoginResponse {
            token,
            message: "Login successful".into(),
        }),
    ))
}

#[instrument(skip(state, q))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(q): Query<VerifyQuery>,
) -> AppResult<StatusCode> {
    let (Some(email), Some(token)) = (q.email, q.token) else {
        return Err(AppError::bad_request("Missing email or token query parameters"));
    };
    services::verify_email(&state, &email.trim().to_lowercase(), &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResendRequest>,
) -> AppResult<StatusCode> {
    services::resend_verification(&state, &payload.email.trim().to_lowercase()).await?;
    Ok(StatusCode::NO_CONTENT)
}
