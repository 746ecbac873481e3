//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId, infrastructure::dto::http::PresenceDto, ui::state::AppState,
    usecase::RoomPresence,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Live presence of a room
pub async fn get_room_presence(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<PresenceDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state.get_presence_usecase.execute(room_id).await {
        Ok(presence) => Ok(Json(presence.into())),
        Err(e) => {
            tracing::error!("Failed to read presence: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

impl From<RoomPresence> for PresenceDto {
    fn from(presence: RoomPresence) -> Self {
        Self {
            room_id: presence.room_id.into_string(),
            user_count: presence.user_count,
            online_user_ids: presence
                .online_user_ids
                .into_iter()
                .map(|id| id.into_string())
                .collect(),
        }
    }
}
