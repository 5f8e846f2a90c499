//! Endpoints the messaging service calls to raise events and force logouts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::gateway::{DispatchSummary, EventArgs, EventPayload, EventType};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(raise_event))
        .route("/users/{user_id}/events", post(notify_user))
        .route("/connections/{user_id}", delete(disconnect_user))
}

// ---------------------------------------------------------------------------
// POST /internal/events
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RaiseEventRequest {
    pub event_type: EventType,
    pub subject: String,
    #[serde(default)]
    pub related: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RaiseEventQuery {
    /// Return before the audience is resolved; failures are only logged.
    #[serde(default)]
    pub detach: bool,
}

#[derive(Debug, Serialize)]
pub struct RaiseEventResponse {
    pub recipients: usize,
    pub connections: usize,
}

impl From<DispatchSummary> for RaiseEventResponse {
    fn from(summary: DispatchSummary) -> Self {
        Self {
            recipients: summary.recipients,
            connections: summary.connections,
        }
    }
}

async fn raise_event(
    State(state): State<AppState>,
    Query(query): Query<RaiseEventQuery>,
    Json(body): Json<RaiseEventRequest>,
) -> Result<Response, ApiError> {
    let args = EventArgs::from_parts(body.subject, body.related);

    if query.detach {
        let expected = body.event_type.arity();
        if args.arity() != expected {
            return Err(ApiError::bad_request(format!(
                "{} takes {expected} argument(s), got {}",
                body.event_type,
                args.arity()
            )));
        }
        state.dispatcher.raise_detached(body.event_type, args);
        return Ok(StatusCode::ACCEPTED.into_response());
    }

    let summary = state.dispatcher.raise(body.event_type, args).await?;
    Ok((StatusCode::ACCEPTED, Json(RaiseEventResponse::from(summary))).into_response())
}

// ---------------------------------------------------------------------------
// POST /internal/users/{user_id}/events
// ---------------------------------------------------------------------------

/// A payload addressed to one user, e.g. telling them they lost access to a
/// channel the rest of its members still see.
#[derive(Debug, Deserialize)]
pub struct NotifyUserRequest {
    pub event_type: EventType,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub key_user: Option<String>,
}

impl From<NotifyUserRequest> for EventPayload {
    fn from(body: NotifyUserRequest) -> Self {
        EventPayload {
            event_type: body.event_type.code(),
            channel: body.channel,
            message: body.message,
            user: body.user,
            key_user: body.key_user,
        }
    }
}

async fn notify_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<NotifyUserRequest>,
) -> (StatusCode, Json<RaiseEventResponse>) {
    let payload = EventPayload::from(body);
    let summary = state.dispatcher.send_to_user(&user_id, &payload);
    (StatusCode::ACCEPTED, Json(RaiseEventResponse::from(summary)))
}

// ---------------------------------------------------------------------------
// DELETE /internal/connections/{user_id}
// ---------------------------------------------------------------------------

async fn disconnect_user(State(state): State<AppState>, Path(user_id): Path<String>) -> StatusCode {
    let closed = state.directory.unregister(&user_id);
    if closed > 0 {
        tracing::info!(%user_id, closed, "user connections force-closed");
    }
    StatusCode::NO_CONTENT
}
