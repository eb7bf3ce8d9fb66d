//! Infrastructure 層
//!
//! ドメイン層が定義する抽象（Repository / MessagePusher）の具体的な実装と、
//! プロトコル境界の DTO を提供する。

pub mod dto;
pub mod message_pusher;
pub mod repository;

pub use message_pusher::WebSocketMessagePusher;
pub use repository::{InMemoryHubRepository, InMemoryMeetingStore};
