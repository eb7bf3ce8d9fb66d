//! CLI client for the Idobata communication hub.
//!
//! Connects to the hub's WebSocket endpoint, joins a chat room and turns
//! stdin lines into hub events: plain text becomes a chat message, slash
//! commands drive private rooms, the match queue and the typing race.

mod command;
mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
