//! Axum handlers for the WebSocket endpoint and the HTTP API.

mod http;
mod websocket;

pub use http::{create_meeting, debug_hub, get_meeting, get_rooms, health_check};
pub use websocket::websocket_handler;
