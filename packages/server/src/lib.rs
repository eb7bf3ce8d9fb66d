//! Idobata realtime hub library.
//!
//! This library provides the server side of a WebSocket-based communication
//! hub: group chat rooms, passcode-protected private rooms, WebRTC signaling
//! relay for calls and meetings, random matchmaking and a typing race.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
