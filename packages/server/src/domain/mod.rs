//! Domain 層
//!
//! ビジネスロジックの中心。値オブジェクト・エンティティ・Hub 集約と、
//! データアクセス（Repository）およびメッセージ通知（MessagePusher）の
//! 抽象を定義する。外部クレートへの依存はここでは持たない
//! （serde/uuid はモデル表現の一部として例外）。

pub mod entity;
pub mod error;
pub mod hub;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    Connection, MatchPair, Meeting, MeetingDraft, RacePlayer, RaceSession, Room, RoomKind,
};
pub use error::{
    FileNoticeError, MeetingError, MessagePushError, RoomError, ValidationError,
};
pub use hub::{
    ConnectOutcome, DisconnectOutcome, FileNoticeOutcome, Hub, HubStats, MeetingJoinOutcome,
    MeetingLeaveOutcome, MeetingParticipant, OnlineUser, PrivateJoinOutcome, PrivateLeaveOutcome,
    PrivateMessageOutcome, PublicJoinOutcome, PublicLeaveOutcome, PublicMessageOutcome,
    RaceJoinOutcome, RaceProgressOutcome, RoomDeparture, RoomMemberInfo, RoomSummary,
    StaleTypingEntry, TypingOutcome,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{HubRepository, MeetingStore};
pub use value_object::{
    ConnectionId, ConnectionIdFactory, Passcode, Progress, RoomId, Timestamp, Username,
};
