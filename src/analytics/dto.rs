use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::analytics::repo::{EventRow, EventTypeCount, Totals};
use crate::auth::dto::PublicUser;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_data: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub event_type: String,
    pub event_data: Value,
    pub user_id: Option<Uuid>,
    pub user: Option<PublicUser>,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<EventRow> for EventResponse {
    fn from(r: EventRow) -> Self {
        // Anonymous events, or events whose user was deleted, carry no user.
        let user = match (r.user_id, r.user_username, r.user_email) {
            (Some(id), Some(username), Some(email)) => Some(PublicUser {
                id,
                username,
                email,
            }),
            _ => None,
        };
        Self {
            id: r.id,
            event_type: r.event_type,
            event_data: r.event_data,
            user_id: r.user_id,
            user,
            session_id: r.session_id,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub recent_events: Vec<EventResponse>,
    pub top_events: Vec<EventTypeCount>,
}
