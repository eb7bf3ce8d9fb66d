//! Conversion logic between domain models and DTOs.
//!
//! Outbound only: inbound payloads go through the value-object
//! constructors in the handlers so validation failures surface as acks,
//! not panics.

use std::collections::BTreeMap;

use idobata_shared::time::timestamp_to_iso8601;

use crate::domain::{
    HubStats, Meeting, MeetingParticipant, OnlineUser, RacePlayer, RoomMemberInfo, RoomSummary,
};
use crate::infrastructure::dto::http::{HubStatsDto, MeetingDto, RoomSummaryDto};
use crate::infrastructure::dto::websocket::{
    OnlineUserInfo, ParticipantInfo, PlayerState, PrivateRoomMember,
};

// ========================================
// Domain Model → WebSocket DTO
// ========================================

impl From<OnlineUser> for OnlineUserInfo {
    fn from(model: OnlineUser) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name.into_string(),
        }
    }
}

impl From<RoomMemberInfo> for PrivateRoomMember {
    fn from(model: RoomMemberInfo) -> Self {
        Self {
            id: model.id.into_string(),
            username: model.username,
        }
    }
}

impl From<MeetingParticipant> for ParticipantInfo {
    fn from(model: MeetingParticipant) -> Self {
        Self {
            id: model.id.into_string(),
            user: model.user,
        }
    }
}

impl From<RacePlayer> for PlayerState {
    fn from(model: RacePlayer) -> Self {
        Self {
            username: model.username.into_string(),
            progress: model.progress.value(),
            wpm: model.wpm,
            accuracy: model.accuracy,
        }
    }
}

/// Build the `updatePlayers` map, keyed by connection id.
pub fn players_to_map(players: Vec<RacePlayer>) -> BTreeMap<String, PlayerState> {
    players
        .into_iter()
        .map(|player| (player.id.as_str().to_string(), PlayerState::from(player)))
        .collect()
}

// ========================================
// Domain Model → HTTP DTO
// ========================================

impl From<Meeting> for MeetingDto {
    fn from(model: Meeting) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            start_at: model.start_at,
            host: model.host,
            link: model.link,
            created_at: timestamp_to_iso8601(model.created_at.value()),
        }
    }
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            room_id: model.room_id.into_string(),
            kind: model.kind.as_str().to_string(),
            user_count: model.member_count,
            created_by: model.created_by.into_string(),
        }
    }
}

impl From<HubStats> for HubStatsDto {
    fn from(model: HubStats) -> Self {
        Self {
            connections: model.connections,
            rooms: model.rooms,
            race_players: model.race_players,
            match_queue: model.match_queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, Progress, RoomId, RoomKind, Timestamp, Username};

    fn connection_id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_online_user_to_dto() {
        // テスト項目: OnlineUser が {id, name} の DTO に変換される
        // given (前提条件):
        let model = OnlineUser {
            id: connection_id("c1"),
            name: Username::new("alice".to_string()).unwrap(),
        };

        // when (操作):
        let dto: OnlineUserInfo = model.into();

        // then (期待する結果):
        assert_eq!(dto.id, "c1");
        assert_eq!(dto.name, "alice");
    }

    #[test]
    fn test_players_to_map_keys_by_connection_id() {
        // テスト項目: updatePlayers のマップが接続 ID をキーにする
        // given (前提条件):
        let players = vec![
            RacePlayer {
                id: connection_id("c2"),
                username: Username::new("bob".to_string()).unwrap(),
                progress: Progress::new(10.0),
                wpm: 40.0,
                accuracy: 90.0,
            },
            RacePlayer {
                id: connection_id("c1"),
                username: Username::new("alice".to_string()).unwrap(),
                progress: Progress::new(55.0),
                wpm: 82.0,
                accuracy: 98.0,
            },
        ];

        // when (操作):
        let map = players_to_map(players);

        // then (期待する結果):
        assert_eq!(map.len(), 2);
        assert_eq!(map["c1"].username, "alice");
        assert_eq!(map["c1"].progress, 55.0);
        assert_eq!(map["c2"].username, "bob");
    }

    #[test]
    fn test_meeting_to_dto_formats_created_at() {
        // テスト項目: Meeting の created_at が ISO 8601 文字列になる
        // given (前提条件):
        let model = Meeting {
            id: "m-1".to_string(),
            title: "Standup".to_string(),
            description: String::new(),
            start_at: "2023-01-01T10:00:00Z".to_string(),
            host: "alice".to_string(),
            link: "meeting-abc".to_string(),
            created_at: Timestamp::new(1672531200000),
        };

        // when (操作):
        let dto: MeetingDto = model.into();

        // then (期待する結果):
        assert_eq!(dto.created_at, "2023-01-01T00:00:00.000Z");
        assert_eq!(dto.title, "Standup");
    }

    #[test]
    fn test_room_summary_to_dto() {
        // テスト項目: RoomSummary が camelCase の DTO に変換される
        // given (前提条件):
        let model = RoomSummary {
            room_id: RoomId::new("secret".to_string()).unwrap(),
            kind: RoomKind::Private,
            member_count: 2,
            created_by: connection_id("c1"),
        };

        // when (操作):
        let dto: RoomSummaryDto = model.into();

        // then (期待する結果):
        assert_eq!(dto.room_id, "secret");
        assert_eq!(dto.kind, "private");
        assert_eq!(dto.user_count, 2);
        assert_eq!(dto.created_by, "c1");
    }
}
