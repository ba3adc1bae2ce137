use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument};

use crate::{
    analytics::{
        dto::{CreateEventRequest, Dashboard, EventResponse},
        repo::{self, NewEvent},
    },
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::ApiJson,
    state::AppState,
};

const RECENT_WINDOW: Duration = Duration::days(30);
const TOP_EVENT_TYPES: i64 = 10;

/// Event ingestion is open to anonymous clients.
pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/analytics/events", post(create_event))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(list_events))
        .route("/analytics/dashboard", get(dashboard))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_default()
}

#[instrument(skip(state, headers, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    let event_type = payload.event_type.trim();
    if event_type.is_empty() {
        return Err(AppError::validation("event_type is required"));
    }

    let event = repo::insert(
        &state.db,
        NewEvent {
            event_type: event_type.to_string(),
            event_data: payload.event_data.unwrap_or_else(|| json!({})),
            user_id: payload.user_id,
            session_id: payload.session_id.unwrap_or_default(),
            ip_address: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
            user_agent: header_str(&headers, "user-agent")
                .unwrap_or_default()
                .to_string(),
        },
    )
    .await?;
    debug!(event_id = %event.id, event_type = %event.event_type, "analytics event recorded");
    Ok((StatusCode::CREATED, Json(event.into())))
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Vec<EventResponse>>> {
    let rows = repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(EventResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Dashboard>> {
    let totals = repo::totals(&state.db).await?;
    let recent_events = repo::since(&state.db, OffsetDateTime::now_utc() - RECENT_WINDOW)
        .await?
        .into_iter()
        .map(EventResponse::from)
        .collect();
    let top_events = repo::top_event_types(&state.db, TOP_EVENT_TYPES).await?;
    Ok(Json(Dashboard {
        totals,
        recent_events,
        top_events,
    }))
}
