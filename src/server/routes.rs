use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::commands::{self, Outcome};
use crate::commands::auth::Credentials;
use crate::commands::chat::{ApiKeyRequest, PromptRequest};
use crate::commands::media::PlayRequest;
use crate::error::AppError;
use crate::services::RechargeForm;
use crate::storage::SessionHandle;
use crate::AppState;

pub const SESSION_HEADER: &str = "x-session-id";
const REMAINING_HEADER: &str = "x-remaining-uses";

type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub filter: String,
}

/// Resolve the caller's session from the `x-session-id` header
async fn session_for(state: &AppState, headers: &HeaderMap) -> AppResult<(String, SessionHandle)> {
    let id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MissingSession)?;

    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;

    Ok((id, handle))
}

/// 200 with the outcome body, or 402 when the gate refused
fn metered_json<T: Serialize>(outcome: Outcome<T>) -> Response {
    let status = if outcome.is_denied() {
        StatusCode::PAYMENT_REQUIRED
    } else {
        StatusCode::OK
    };
    (status, Json(outcome)).into_response()
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let (id, _) = session_for(&state, &headers).await?;
    state.sessions.remove(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let session = handle.lock().await;
    Ok(Json(commands::auth::status(&session)).into_response())
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(form): Json<Credentials>,
) -> AppResult<StatusCode> {
    commands::auth::signup(&state, &form).await?;
    Ok(StatusCode::CREATED)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(form): Json<Credentials>,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let status = commands::auth::login(&state, &mut session, &form).await?;
    Ok(Json(status).into_response())
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    Ok(Json(commands::auth::logout(&mut session)).into_response())
}

pub async fn apply_image_filter(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FilterQuery>,
    body: Bytes,
) -> AppResult<Response> {
    let (id, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let outcome =
        commands::media::apply_image_filter(&state, &id, &mut session, body, &query.filter).await?;

    match outcome {
        Outcome::Completed {
            value,
            remaining_uses,
        } => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    HeaderName::from_static(REMAINING_HEADER),
                    remaining_uses.to_string(),
                ),
            ],
            value,
        )
            .into_response()),
        denied => Ok(metered_json(denied)),
    }
}

pub async fn list_videos(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(commands::media::list_videos(&state))
}

pub async fn play_video(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PlayRequest>,
) -> AppResult<Response> {
    let (id, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let outcome = commands::media::play_video(&state, &id, &mut session, &req.label).await?;
    Ok(metered_json(outcome))
}

pub async fn recharge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(form): Json<RechargeForm>,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let receipt = commands::account::recharge(&state, &mut session, &form)?;
    Ok(Json(receipt).into_response())
}

#[derive(Debug, Serialize)]
pub struct PackageInfo {
    pub label: &'static str,
    pub units: u32,
}

pub async fn recharge_packages(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let packages: Vec<PackageInfo> = state
        .recharge
        .packages()
        .into_iter()
        .map(|(label, units)| PackageInfo { label, units })
        .collect();
    Json(packages)
}

pub async fn simple_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PromptRequest>,
) -> AppResult<Response> {
    let (id, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let outcome = commands::chat::simple_chat(&state, &id, &mut session, &req.prompt).await?;
    Ok(metered_json(outcome))
}

pub async fn assistant_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PromptRequest>,
) -> AppResult<Response> {
    let (id, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let outcome = commands::chat::assistant_chat(&state, &id, &mut session, &req.prompt).await?;
    Ok(metered_json(outcome))
}

pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let session = handle.lock().await;
    Ok(Json(commands::chat::chat_history(&session)).into_response())
}

pub async fn clear_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    Ok(Json(commands::chat::clear_chat(&mut session)).into_response())
}

pub async fn api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let session = handle.lock().await;
    Ok(Json(commands::chat::api_key(&state, &session)).into_response())
}

pub async fn set_api_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ApiKeyRequest>,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    Ok(Json(commands::chat::set_api_key(&state, &mut session, req.api_key)).into_response())
}

pub async fn toggle_flag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let flag = commands::content::toggle_flag(&mut session, &name)?;
    Ok(Json(flag).into_response())
}

pub async fn revealed_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (_, handle) = session_for(&state, &headers).await?;
    let session = handle.lock().await;
    Ok(Json(commands::content::revealed_text(&state, &session)?).into_response())
}

pub async fn reveal_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let (id, handle) = session_for(&state, &headers).await?;
    let mut session = handle.lock().await;
    let outcome = commands::content::reveal_text(&state, &id, &mut session).await?;
    Ok(metered_json(outcome))
}
