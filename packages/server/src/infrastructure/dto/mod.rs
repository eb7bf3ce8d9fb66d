//! Data Transfer Objects (DTOs) for the hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event DTOs (inbound `ClientEvent`, outbound `ServerEvent`)
//! - `http`: HTTP API request/response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
