//! インメモリ Repository 実装

pub mod hub;
pub mod meeting;

pub use hub::InMemoryHubRepository;
pub use meeting::InMemoryMeetingStore;
