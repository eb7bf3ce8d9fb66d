//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::MeetingError,
    infrastructure::dto::http::{
        ApiErrorResponse, CreateMeetingRequest, CreateMeetingResponse, GetMeetingResponse,
        HubStatsDto, RoomsResponse,
    },
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a meeting
///
/// `title` and `startAt` are mandatory; the rest of the body is optional.
pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMeetingRequest>,
) -> Result<Json<CreateMeetingResponse>, (StatusCode, Json<ApiErrorResponse>)> {
    let meeting = state
        .meeting_usecase
        .create_meeting(body.title, body.description, body.start_at, body.host)
        .await
        .map_err(meeting_error_response)?;

    tracing::info!("Meeting '{}' created", meeting.id);
    Ok(Json(CreateMeetingResponse {
        success: true,
        meeting_id: meeting.id,
        message: "Meeting created successfully".to_string(),
    }))
}

/// Get meeting metadata by ID
pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
) -> Result<Json<GetMeetingResponse>, (StatusCode, Json<ApiErrorResponse>)> {
    let meeting = state
        .meeting_usecase
        .get_meeting(&meeting_id)
        .await
        .map_err(meeting_error_response)?;

    Ok(Json(GetMeetingResponse {
        success: true,
        meeting: meeting.into(),
    }))
}

/// Get the list of active chat rooms
///
/// Passcodes are never part of the response.
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomsResponse> {
    let rooms = state.presence_usecase.rooms_summary().await;

    // Domain Model から DTO への変換
    Json(RoomsResponse {
        success: true,
        active_rooms: rooms.len(),
        rooms: rooms.into_iter().map(Into::into).collect(),
    })
}

/// Debug endpoint to get hub counters (for testing purposes)
pub async fn debug_hub(State(state): State<Arc<AppState>>) -> Json<HubStatsDto> {
    let stats: HubStatsDto = state.presence_usecase.hub_stats().await.into();
    Json(stats)
}

fn meeting_error_response(e: MeetingError) -> (StatusCode, Json<ApiErrorResponse>) {
    let status = match e {
        MeetingError::NotFound => StatusCode::NOT_FOUND,
        MeetingError::MissingField => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ApiErrorResponse {
            success: false,
            message: e.to_string(),
        }),
    )
}
