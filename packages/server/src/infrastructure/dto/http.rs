//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

/// Request body of `POST /api/meetings`.
///
/// Everything is optional at the wire level; the handler enforces that
/// `title` and `startAt` are present and rejects with 400 otherwise.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
}

/// Response of `POST /api/meetings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingResponse {
    pub success: bool,
    pub meeting_id: String,
    pub message: String,
}

/// Error body shared by the meeting endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Meeting metadata as returned by `GET /api/meetings/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_at: String,
    pub host: String,
    pub link: String,
    pub created_at: String,
}

/// Response of `GET /api/meetings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMeetingResponse {
    pub success: bool,
    pub meeting: MeetingDto,
}

/// One active room in `GET /api/rooms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub kind: String,
    pub user_count: usize,
    pub created_by: String,
}

/// Response of `GET /api/rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsResponse {
    pub success: bool,
    pub active_rooms: usize,
    pub rooms: Vec<RoomSummaryDto>,
}

/// Response of `GET /debug/hub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatsDto {
    pub connections: usize,
    pub rooms: usize,
    pub race_players: usize,
    pub match_queue: usize,
}
