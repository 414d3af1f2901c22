// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Public: `GET /health`, `GET /webhook`, `POST /webhook`.
//! Gated: `/admin/*` and `/whatsapp/*`.

use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parley_agent::{Verification, verify_subscription};
use parley_core::{
    ChatMessage, Conversation, ConversationStatus, DispatchReceipt, HealthStatus, Intent,
    NewIntent, ParleyError, PhoneInfo, User, UserPatch,
};
use parley_whatsapp::WebhookEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::server::AppState;

/// Template language used when a send omits one.
const DEFAULT_TEMPLATE_LANGUAGE: &str = "en_US";

/// Largest history page an admin caller can request.
const MAX_HISTORY_LIMIT: i64 = 500;

const SERVICE_NAME: &str = "parley";

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
    pub storage: String,
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Response {
    let storage = match state.pipeline.store().health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };

    let (status, code, storage) = match storage {
        HealthStatus::Healthy => ("healthy", StatusCode::OK, "healthy".to_string()),
        HealthStatus::Degraded(msg) => ("degraded", StatusCode::OK, format!("degraded: {msg}")),
        HealthStatus::Unhealthy(msg) => (
            "unhealthy",
            StatusCode::SERVICE_UNAVAILABLE,
            format!("unhealthy: {msg}"),
        ),
    };

    (
        code,
        Json(HealthResponse {
            status,
            service: SERVICE_NAME,
            timestamp: chrono::Utc::now().timestamp_millis(),
            storage,
        }),
    )
        .into_response()
}

/// Reads `hub.<name>` or, failing that, the bare `<name>` parameter.
fn hub_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(&format!("hub.{name}"))
        .or_else(|| params.get(name))
        .map(String::as_str)
}

/// GET /webhook: the provider's subscription handshake.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let outcome = verify_subscription(
        hub_param(&params, "mode"),
        hub_param(&params, "verify_token"),
        hub_param(&params, "challenge"),
        state.config.whatsapp.verify_token.as_deref(),
    );

    match outcome {
        Verification::Liveness => (StatusCode::OK, "Webhook is up").into_response(),
        Verification::Verified(challenge) => (StatusCode::OK, challenge).into_response(),
        Verification::MissingChallenge => {
            (StatusCode::BAD_REQUEST, "Missing challenge").into_response()
        }
        Verification::Rejected => {
            (StatusCode::BAD_REQUEST, "Invalid verification token").into_response()
        }
    }
}

/// POST /webhook
///
/// Acknowledges with `{"status":"success"}` regardless of per-message
/// outcomes. Only a body that is not a structurally valid envelope gets
/// a 500.
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "rejected malformed webhook payload");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response();
        }
    };

    let report = state.pipeline.handle_event(&event).await;
    info!(
        messages = report.outcomes.len(),
        replied = report.replied(),
        failed = report.failed(),
        "webhook event processed"
    );
    (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
}

/// GET /admin/intents
pub async fn list_intents(State(state): State<AppState>) -> Result<Json<Vec<Intent>>, ApiError> {
    Ok(Json(state.pipeline.store().list_active_intents().await?))
}

/// POST /admin/intents
pub async fn create_intent(
    State(state): State<AppState>,
    Json(body): Json<NewIntent>,
) -> Result<(StatusCode, Json<Intent>), ApiError> {
    let intent = state.pipeline.store().create_intent(body).await?;
    info!(intent = %intent.name, "intent created");
    Ok((StatusCode::CREATED, Json(intent)))
}

/// PUT /admin/intents/{id}
pub async fn update_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewIntent>,
) -> Result<Json<Intent>, ApiError> {
    Ok(Json(state.pipeline.store().update_intent(&id, body).await?))
}

/// DELETE /admin/intents/{id}
pub async fn delete_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.pipeline.store().delete_intent(&id).await?;
    info!(intent_id = %id, "intent deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /admin/conversations/{user_id}?limit=N
pub async fn conversation_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.config.bot.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(
        state.pipeline.store().history_for_user(&user_id, limit).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ConversationStatusUpdate {
    pub status: ConversationStatus,
    pub version: i64,
}

/// PATCH /admin/conversations/{conversation_id}
pub async fn update_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<ConversationStatusUpdate>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .pipeline
        .store()
        .update_conversation_status(&conversation_id, body.status, body.version)
        .await?;
    Ok(Json(conversation))
}

#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    #[serde(flatten)]
    pub patch: UserPatch,
    pub version: i64,
}

/// PATCH /admin/users/{user_id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .pipeline
        .store()
        .update_user(&user_id, body.patch, body.version)
        .await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct SendTextBody {
    pub to: String,
    pub message: String,
}

/// POST /whatsapp/send/text
///
/// One dispatch attempt; nothing is persisted.
pub async fn send_text(
    State(state): State<AppState>,
    Json(body): Json<SendTextBody>,
) -> Result<Json<DispatchReceipt>, ApiError> {
    if body.to.trim().is_empty() || body.message.is_empty() {
        return Err(ParleyError::Validation("`to` and `message` are required".into()).into());
    }
    let receipt = state
        .pipeline
        .dispatcher()
        .send_text(&body.to, &body.message)
        .await
        .map_err(ParleyError::from)?;
    info!(to = %body.to, "manual message sent");
    Ok(Json(receipt))
}

fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ParleyError::Validation(format!("`{field}` is required")).into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SendTemplateBody {
    pub to: String,
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// POST /whatsapp/send/template
pub async fn send_template(
    State(state): State<AppState>,
    Json(body): Json<SendTemplateBody>,
) -> Result<Json<DispatchReceipt>, ApiError> {
    required("to", &body.to)?;
    required("name", &body.name)?;
    let language = body
        .language
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(DEFAULT_TEMPLATE_LANGUAGE);
    let receipt = state
        .pipeline
        .dispatcher()
        .send_template(&body.to, &body.name, language)
        .await
        .map_err(ParleyError::from)?;
    info!(to = %body.to, template = %body.name, language, "template message sent");
    Ok(Json(receipt))
}

#[derive(Debug, Deserialize)]
pub struct SendMediaBody {
    pub to: String,
    pub media_id: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// POST /whatsapp/send/media
///
/// Sends an image previously uploaded to the provider.
pub async fn send_media(
    State(state): State<AppState>,
    Json(body): Json<SendMediaBody>,
) -> Result<Json<DispatchReceipt>, ApiError> {
    required("to", &body.to)?;
    required("media_id", &body.media_id)?;
    let receipt = state
        .pipeline
        .dispatcher()
        .send_media(&body.to, &body.media_id, body.caption.as_deref())
        .await
        .map_err(ParleyError::from)?;
    info!(to = %body.to, media_id = %body.media_id, "media message sent");
    Ok(Json(receipt))
}

/// GET /whatsapp/phone-info
pub async fn phone_info(State(state): State<AppState>) -> Result<Json<PhoneInfo>, ApiError> {
    let info = state
        .pipeline
        .dispatcher()
        .phone_info()
        .await
        .map_err(ParleyError::from)?;
    Ok(Json(info))
}
