//! HTTP API response DTOs.

use serde::Serialize;

/// Live presence of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDto {
    pub room_id: String,
    pub user_count: usize,
    pub online_user_ids: Vec<String>,
}
