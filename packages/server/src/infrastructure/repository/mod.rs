//! Repository 実装
//!
//! ドメイン層が定義する trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `inmemory`: インメモリ実装（単一プロセス運用向け）

pub mod inmemory;

pub use inmemory::{InMemoryHubRepository, InMemoryMeetingStore};
