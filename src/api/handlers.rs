//! HTTP request handlers

use super::types::{
    CreateSessionRequest, ErrorResponse, HealthResponse, MessagesQuery, MessagesResponse,
    PushResponse, SendMessageRequest, SendMessageResponse, SessionResponse,
};
use super::AppState;
use crate::error::{ChatError, ErrorKind};
use crate::runtime::BackendPush;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Header carrying the relay credential
const API_KEY_HEADER: &str = "x-api-key";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/messages", get(list_messages).post(send_message))
        // Backend-originated pushes
        .route("/webhook/vale", post(receive_push))
        .route("/health", get(health))
        .with_state(state)
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let Json(req) = body.unwrap_or_default();
    let session = state.service.create_session(req.player.as_deref())?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            expires_at: session.created_at + state.session_ttl,
            session_token: session.token,
            player: session.player_id,
        }),
    ))
}

// ============================================================
// Messages
// ============================================================

async fn list_messages(
    State(state): State<AppState>,
    query: Option<Query<MessagesQuery>>,
) -> Result<Json<MessagesResponse>, AppError> {
    let Query(query) = query.unwrap_or_default();
    let token = query.session_token.unwrap_or_default();
    let (session, messages) = state.service.session_history(&token)?;

    Ok(Json(MessagesResponse {
        messages: messages.into_iter().map(Into::into).collect(),
        is_active: session.is_active,
    }))
}

async fn send_message(
    State(state): State<AppState>,
    body: Option<Json<SendMessageRequest>>,
) -> Result<(StatusCode, Json<SendMessageResponse>), AppError> {
    let Json(req) = body.unwrap_or_default();
    let trip = state
        .service
        .submit_player_message(
            req.session_token.as_deref().unwrap_or(""),
            req.player.as_deref(),
            req.message.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            player_message: trip.player_message.into(),
            backend_message: trip.backend_message.into(),
            ended: trip.ended,
        }),
    ))
}

// ============================================================
// Relay
// ============================================================

async fn receive_push(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<BackendPush>>,
) -> Result<Json<PushResponse>, AppError> {
    let credential = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let Json(push) = body.unwrap_or_default();
    let outcome = state.service.receive_backend_push(credential, &push)?;

    Ok(Json(PushResponse {
        status: "ok",
        ended: outcome.ended,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ============================================================
// Error Handling
// ============================================================

struct AppError(ChatError);

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind);
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind.as_str(), error = %self.0.message, "Request failed");
        }
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}
