//! Hub 集約
//!
//! 接続レジストリ・ルーム・タイピングレース・マッチングキュー・
//! タイピング中状態を 1 つの集約として管理する。各メソッドは
//! 「1 イベント = 1 回の状態遷移」になるよう、判定・更新・通知先の
//! スナップショット取得までをまとめて行い、Outcome として返す。
//! I/O は一切行わない（通知は呼び出し側が Outcome を見て行う）。

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use super::entity::{Connection, MatchPair, RacePlayer, RaceSession, Room, RoomKind};
use super::error::{FileNoticeError, RoomError};
use super::value_object::{ConnectionId, Passcode, Progress, RoomId, Timestamp, Username};

/// オンライン一覧の 1 エントリ（ユーザー名を名乗った接続のみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub id: ConnectionId,
    pub name: Username,
}

/// ルームメンバーの表示用情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMemberInfo {
    pub id: ConnectionId,
    /// ユーザー名（未設定ならプレースホルダ名）
    pub username: String,
}

/// ミーティング参加者（`join-meeting` で申告されたユーザー情報付き）
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingParticipant {
    pub id: ConnectionId,
    pub user: Option<Value>,
}

/// 接続登録の結果
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub online_count: usize,
    /// オンライン人数の通知先（本人を含む全接続）
    pub all_connections: Vec<ConnectionId>,
}

/// 公開ルームからの退出（自動退出を含む）の結果
#[derive(Debug, Clone)]
pub struct PublicLeaveOutcome {
    pub room_id: RoomId,
    /// 退出通知の宛先（残ったメンバー）
    pub remaining: Vec<ConnectionId>,
}

/// 公開ルーム参加の結果
#[derive(Debug, Clone)]
pub struct PublicJoinOutcome {
    /// ルームへの参加が成立したか
    ///
    /// 同名の別種ルーム（プライベート・ミーティング）が存在する場合は
    /// 不成立になる。その場合でもユーザー名の申告は有効のまま。
    pub joined_room: bool,
    /// 新規参加か（同じルームへの再 join なら false）
    pub newly_joined: bool,
    /// 自動退出した直前の公開ルーム
    pub previous_room: Option<PublicLeaveOutcome>,
    /// 参加通知の宛先（本人以外のメンバー）
    pub other_members: Vec<ConnectionId>,
    pub online_users: Vec<OnlineUser>,
    pub all_connections: Vec<ConnectionId>,
}

/// プライベートルーム参加の結果
#[derive(Debug, Clone)]
pub struct PrivateJoinOutcome {
    /// 参加者の表示名
    pub joiner_name: String,
    /// 参加後の全メンバー（通知先でもある）
    pub members: Vec<RoomMemberInfo>,
}

/// プライベートルーム退出の結果
#[derive(Debug, Clone)]
pub struct PrivateLeaveOutcome {
    /// 退出者の表示名
    pub username: String,
    /// 退出後の残メンバー（通知先でもある）
    pub remaining: Vec<RoomMemberInfo>,
    pub room_deleted: bool,
}

/// ミーティング参加の結果
#[derive(Debug, Clone)]
pub struct MeetingJoinOutcome {
    /// 参加時点で既にいた参加者（本人を除く）
    pub existing: Vec<MeetingParticipant>,
}

/// ミーティング退出の結果
#[derive(Debug, Clone)]
pub struct MeetingLeaveOutcome {
    pub remaining: Vec<ConnectionId>,
}

/// 公開チャットメッセージの送信先解決の結果
#[derive(Debug, Clone)]
pub struct PublicMessageOutcome {
    pub username: Username,
    pub room_id: RoomId,
    /// 送信者本人を含むルーム全員
    pub targets: Vec<ConnectionId>,
}

/// プライベートメッセージの送信先解決の結果
#[derive(Debug, Clone)]
pub struct PrivateMessageOutcome {
    /// 送信者の表示名（ペイロードにユーザー名が無いときに使う）
    pub sender_name: String,
    pub targets: Vec<ConnectionId>,
}

/// ファイル共有通知の送信先解決の結果
#[derive(Debug, Clone)]
pub struct FileNoticeOutcome {
    pub username: Username,
    pub targets: Vec<ConnectionId>,
}

/// タイピング中通知の結果
#[derive(Debug, Clone)]
pub struct TypingOutcome {
    pub username: Option<Username>,
    pub targets: Vec<ConnectionId>,
}

/// 失効（または切断で解除）したタイピング中状態
#[derive(Debug, Clone)]
pub struct StaleTypingEntry {
    pub connection_id: ConnectionId,
    /// None なら全体スコープ
    pub room: Option<RoomId>,
    pub targets: Vec<ConnectionId>,
}

/// タイピングレース参加の結果
#[derive(Debug, Clone)]
pub struct RaceJoinOutcome {
    pub paragraph: String,
    pub players: Vec<RacePlayer>,
    pub all_connections: Vec<ConnectionId>,
}

/// タイピングレース進捗更新の結果
#[derive(Debug, Clone)]
pub struct RaceProgressOutcome {
    /// このエポックで新しく確定した勝者
    pub winner: Option<Username>,
    pub players: Vec<RacePlayer>,
    pub all_connections: Vec<ConnectionId>,
}

/// 切断時に退出したルームの情報
#[derive(Debug, Clone)]
pub struct RoomDeparture {
    pub room_id: RoomId,
    pub kind: RoomKind,
    /// 退出者の表示名
    pub display_name: String,
    /// 残メンバー（通知先）
    pub remaining: Vec<ConnectionId>,
    /// 残メンバーの表示用情報（プライベートルームのリスト更新用）
    pub remaining_members: Vec<RoomMemberInfo>,
    pub room_deleted: bool,
}

/// 切断処理の結果
///
/// 後片付けの順序: マッチングキュー → レース → タイピング中状態 →
/// ルーム退出 → 接続レジストリ。通知はこの Outcome を見て呼び出し側が行う。
#[derive(Debug, Clone)]
pub struct DisconnectOutcome {
    /// 登録済みの接続だったか（false なら何も起きていない）
    pub was_registered: bool,
    pub username: Option<Username>,
    /// レースに参加していた場合、削除後のプレイヤー一覧
    pub race_players: Option<Vec<RacePlayer>>,
    /// 解除されたタイピング中状態
    pub typing_clears: Vec<StaleTypingEntry>,
    /// 退出したルームごとの通知情報（ルーム ID 順）
    pub departures: Vec<RoomDeparture>,
    pub online_count: usize,
    pub online_users: Vec<OnlineUser>,
    /// 残った全接続（人数・一覧のブロードキャスト先）
    pub remaining_connections: Vec<ConnectionId>,
}

/// アクティブなルームの概要（HTTP API 用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub kind: RoomKind,
    pub member_count: usize,
    pub created_by: ConnectionId,
}

/// Hub 全体の統計（デバッグ用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub rooms: usize,
    pub race_players: usize,
    pub match_queue: usize,
}

/// 接続・ルーム・レース・マッチング・タイピング状態の集約
#[derive(Debug)]
pub struct Hub {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomId, Room>,
    race: RaceSession,
    match_queue: VecDeque<ConnectionId>,
    /// スコープ（None = 全体、Some = ルーム）ごとのタイピング中接続と最終更新時刻
    typing: HashMap<Option<RoomId>, HashMap<ConnectionId, Timestamp>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            rooms: HashMap::new(),
            race: RaceSession::new(),
            match_queue: VecDeque::new(),
            typing: HashMap::new(),
        }
    }

    // ----- 接続レジストリ -----

    /// 接続を登録する
    pub fn register_connection(
        &mut self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> ConnectOutcome {
        self.connections
            .insert(id.clone(), Connection::new(id, connected_at));
        ConnectOutcome {
            online_count: self.connections.len(),
            all_connections: self.all_connection_ids(),
        }
    }

    pub fn online_count(&self) -> usize {
        self.connections.len()
    }

    /// ユーザー名を名乗った接続の一覧（接続 ID 順）
    pub fn online_users(&self) -> Vec<OnlineUser> {
        let mut users: Vec<OnlineUser> = self
            .connections
            .values()
            .filter_map(|conn| {
                conn.username.clone().map(|name| OnlineUser {
                    id: conn.id.clone(),
                    name,
                })
            })
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    pub fn all_connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.connections.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ----- 公開ルーム -----

    /// 公開ルームに参加する
    ///
    /// ユーザー名の申告を確定させ、直前の公開ルームから自動退出する。
    /// ルームは無ければ作る。未登録の接続なら `None`。
    pub fn join_public_room(
        &mut self,
        id: &ConnectionId,
        room_id: RoomId,
        username: Username,
        now: Timestamp,
    ) -> Option<PublicJoinOutcome> {
        if !self.connections.contains_key(id) {
            return None;
        }

        // 同名の別種ルームへはパスコードを迂回して入れない
        let kind_clash = self
            .rooms
            .get(&room_id)
            .is_some_and(|room| room.kind != RoomKind::Public);

        if let Some(conn) = self.connections.get_mut(id) {
            conn.username = Some(username);
        }

        if kind_clash {
            return Some(PublicJoinOutcome {
                joined_room: false,
                newly_joined: false,
                previous_room: None,
                other_members: Vec::new(),
                online_users: self.online_users(),
                all_connections: self.all_connection_ids(),
            });
        }

        // 直前の公開ルームから自動退出（同じルームへの再 join なら何もしない）
        let previous = self
            .connections
            .get(id)
            .and_then(|conn| conn.public_room.clone());
        let mut previous_room = None;
        if let Some(prev) = previous {
            if prev != room_id {
                if let Some(room) = self.rooms.get_mut(&prev) {
                    room.remove_member(id);
                    let remaining = room.members.clone();
                    if room.is_empty() {
                        self.rooms.remove(&prev);
                    }
                    previous_room = Some(PublicLeaveOutcome {
                        room_id: prev,
                        remaining,
                    });
                }
            }
        }

        let room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone(), RoomKind::Public, id.clone(), now));
        let newly_joined = room.add_member(id.clone());
        let other_members: Vec<ConnectionId> = room
            .members
            .iter()
            .filter(|member| *member != id)
            .cloned()
            .collect();

        if let Some(conn) = self.connections.get_mut(id) {
            conn.public_room = Some(room_id);
        }

        Some(PublicJoinOutcome {
            joined_room: true,
            newly_joined,
            previous_room,
            other_members,
            online_users: self.online_users(),
            all_connections: self.all_connection_ids(),
        })
    }

    // ----- プライベートルーム -----

    /// プライベートルームを作成し、作成者を参加させる
    pub fn create_private_room(
        &mut self,
        id: &ConnectionId,
        room_id: RoomId,
        passcode: Passcode,
        username: Username,
        now: Timestamp,
    ) -> Result<(), RoomError> {
        if !self.connections.contains_key(id) {
            return Err(RoomError::RoomNotFound);
        }
        // 名前空間は全ルーム共通。既存 ID への上書きはさせない
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::RoomAlreadyExists);
        }

        if let Some(conn) = self.connections.get_mut(id) {
            conn.username = Some(username);
        }

        let mut room =
            Room::with_passcode(room_id.clone(), RoomKind::Private, passcode, id.clone(), now);
        room.add_member(id.clone());
        self.rooms.insert(room_id, room);
        Ok(())
    }

    /// プライベートルームに参加する
    pub fn join_private_room(
        &mut self,
        id: &ConnectionId,
        room_id: &RoomId,
        passcode: &Passcode,
        username: Option<Username>,
    ) -> Result<PrivateJoinOutcome, RoomError> {
        if !self.connections.contains_key(id) {
            return Err(RoomError::RoomNotFound);
        }
        let room = self.rooms.get(room_id).ok_or(RoomError::RoomNotFound)?;
        if room.kind != RoomKind::Private {
            return Err(RoomError::RoomNotFound);
        }
        if room.passcode.as_ref() != Some(passcode) {
            return Err(RoomError::InvalidPasscode);
        }

        if let Some(name) = username {
            if let Some(conn) = self.connections.get_mut(id) {
                conn.username = Some(name);
            }
        }

        let Some(room) = self.rooms.get_mut(room_id) else {
            return Err(RoomError::RoomNotFound);
        };
        room.add_member(id.clone());
        let member_ids = room.members.clone();

        Ok(PrivateJoinOutcome {
            joiner_name: self.display_name_of(id),
            members: self.member_infos(&member_ids),
        })
    }

    /// プライベートルームから退出する（メンバーでなければ何もしない）
    pub fn leave_private_room(
        &mut self,
        id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<PrivateLeaveOutcome> {
        let username = self.display_name_of(id);
        let room = self.rooms.get_mut(room_id)?;
        if room.kind != RoomKind::Private || !room.remove_member(id) {
            return None;
        }
        let remaining_ids = room.members.clone();
        let room_deleted = room.is_empty();
        if room_deleted {
            self.rooms.remove(room_id);
        }
        Some(PrivateLeaveOutcome {
            username,
            remaining: self.member_infos(&remaining_ids),
            room_deleted,
        })
    }

    // ----- ミーティングルーム -----

    /// ミーティングルームに参加する
    ///
    /// 申告されたユーザー情報を接続に保存する。ルームは無ければ作る。
    pub fn join_meeting_room(
        &mut self,
        id: &ConnectionId,
        meeting_id: RoomId,
        user: Option<Value>,
        now: Timestamp,
    ) -> Option<MeetingJoinOutcome> {
        if !self.connections.contains_key(id) {
            return None;
        }
        if let Some(existing) = self.rooms.get(&meeting_id) {
            if existing.kind != RoomKind::Meeting {
                return None;
            }
        }

        if let Some(conn) = self.connections.get_mut(id) {
            conn.meeting_user = user;
        }

        let room = self
            .rooms
            .entry(meeting_id.clone())
            .or_insert_with(|| Room::new(meeting_id.clone(), RoomKind::Meeting, id.clone(), now));
        let existing_ids: Vec<ConnectionId> = room
            .members
            .iter()
            .filter(|member| *member != id)
            .cloned()
            .collect();
        room.add_member(id.clone());

        let existing = existing_ids
            .into_iter()
            .map(|member_id| {
                let user = self
                    .connections
                    .get(&member_id)
                    .and_then(|conn| conn.meeting_user.clone());
                MeetingParticipant {
                    id: member_id,
                    user,
                }
            })
            .collect();

        Some(MeetingJoinOutcome { existing })
    }

    /// ミーティングルームから退出する
    pub fn leave_meeting_room(
        &mut self,
        id: &ConnectionId,
        meeting_id: &RoomId,
    ) -> Option<MeetingLeaveOutcome> {
        let room = self.rooms.get_mut(meeting_id)?;
        if room.kind != RoomKind::Meeting {
            return None;
        }
        room.remove_member(id);
        let remaining = room.members.clone();
        if room.is_empty() {
            self.rooms.remove(meeting_id);
        }
        Some(MeetingLeaveOutcome { remaining })
    }

    // ----- メッセージの宛先解決 -----

    /// 公開チャットの宛先（名乗りと参加ルームが揃っていなければ `None`）
    pub fn public_message_targets(&self, id: &ConnectionId) -> Option<PublicMessageOutcome> {
        let conn = self.connections.get(id)?;
        let username = conn.username.clone()?;
        let room_id = conn.public_room.clone()?;
        let targets = self.rooms.get(&room_id)?.members.clone();
        Some(PublicMessageOutcome {
            username,
            room_id,
            targets,
        })
    }

    /// プライベートメッセージの宛先（非メンバーは `NotAMember`）
    pub fn private_message_targets(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<PrivateMessageOutcome, RoomError> {
        let room = self.rooms.get(room_id).ok_or(RoomError::NotAMember)?;
        if room.kind != RoomKind::Private || !room.is_member(id) {
            return Err(RoomError::NotAMember);
        }
        Ok(PrivateMessageOutcome {
            sender_name: self.display_name_of(id),
            targets: room.members.clone(),
        })
    }

    /// ミーティングイベント（チャット・録画通知）の宛先
    pub fn meeting_targets(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    /// 接続に保存されたミーティングユーザー情報
    pub fn meeting_user(&self, id: &ConnectionId) -> Option<Value> {
        self.connections
            .get(id)
            .and_then(|conn| conn.meeting_user.clone())
    }

    /// ファイル共有通知の宛先
    pub fn file_notice_targets(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
        is_private: bool,
    ) -> Result<FileNoticeOutcome, FileNoticeError> {
        let username = self
            .connections
            .get(id)
            .and_then(|conn| conn.username.clone())
            .ok_or(FileNoticeError::MissingIdentity)?;
        let room = self.rooms.get(room_id);

        if is_private {
            match room {
                Some(room) if room.kind == RoomKind::Private && room.is_member(id) => {
                    Ok(FileNoticeOutcome {
                        username,
                        targets: room.members.clone(),
                    })
                }
                _ => Err(FileNoticeError::NotInPrivateRoom),
            }
        } else {
            match room {
                Some(room) if room.is_member(id) => Ok(FileNoticeOutcome {
                    username,
                    targets: room.members.clone(),
                }),
                _ => Err(FileNoticeError::NotInRoom),
            }
        }
    }

    // ----- タイピング中状態 -----

    /// タイピング中として記録し、通知先を返す
    ///
    /// ルームスコープは当該ルームのメンバーでなければ無効（`None`)。
    pub fn set_typing(
        &mut self,
        id: &ConnectionId,
        room: Option<RoomId>,
        now: Timestamp,
    ) -> Option<TypingOutcome> {
        let username = self.connections.get(id)?.username.clone();
        if let Some(room_id) = &room {
            if !self.rooms.get(room_id)?.is_member(id) {
                return None;
            }
        }
        let targets = self.typing_targets(room.as_ref(), id);
        self.typing.entry(room).or_default().insert(id.clone(), now);
        Some(TypingOutcome { username, targets })
    }

    /// タイピング中状態を解除し、通知先を返す
    ///
    /// 記録が無くても通知だけは行えるよう、解除自体は常に成功扱い。
    pub fn clear_typing(
        &mut self,
        id: &ConnectionId,
        room: Option<RoomId>,
    ) -> Option<TypingOutcome> {
        let username = self.connections.get(id)?.username.clone();
        if let Some(room_id) = &room {
            if !self.rooms.get(room_id)?.is_member(id) {
                return None;
            }
        }
        let targets = self.typing_targets(room.as_ref(), id);
        if let Some(entries) = self.typing.get_mut(&room) {
            entries.remove(id);
            if entries.is_empty() {
                self.typing.remove(&room);
            }
        }
        Some(TypingOutcome { username, targets })
    }

    /// 一定時間更新されていないタイピング中状態を失効させる
    pub fn sweep_stale_typing(&mut self, now: Timestamp, ttl_millis: i64) -> Vec<StaleTypingEntry> {
        let mut expired: Vec<(Option<RoomId>, ConnectionId)> = Vec::new();
        self.typing.retain(|scope, entries| {
            entries.retain(|connection_id, last_refreshed| {
                let stale = now.value().saturating_sub(last_refreshed.value()) >= ttl_millis;
                if stale {
                    expired.push((scope.clone(), connection_id.clone()));
                }
                !stale
            });
            !entries.is_empty()
        });

        expired
            .into_iter()
            .map(|(room, connection_id)| StaleTypingEntry {
                targets: self.typing_targets(room.as_ref(), &connection_id),
                connection_id,
                room,
            })
            .collect()
    }

    // ----- ランダムマッチング -----

    /// マッチングキューに並ばせ、2 人揃えば先頭からペアを成立させる
    ///
    /// 既に並んでいる接続の再リクエストはキューを変えない。
    pub fn enqueue_for_match(&mut self, id: &ConnectionId) -> Option<MatchPair> {
        if !self.connections.contains_key(id) {
            return None;
        }
        if !self.match_queue.contains(id) {
            self.match_queue.push_back(id.clone());
        }
        if self.match_queue.len() >= 2 {
            let first = self.match_queue.pop_front()?;
            let second = self.match_queue.pop_front()?;
            return Some(MatchPair { first, second });
        }
        None
    }

    // ----- タイピングレース -----

    /// タイピングレースに参加する
    pub fn join_race(&mut self, id: &ConnectionId, username: Username) -> Option<RaceJoinOutcome> {
        if !self.connections.contains_key(id) {
            return None;
        }
        self.race.join(id.clone(), username);
        Some(RaceJoinOutcome {
            paragraph: self.race.paragraph.clone(),
            players: self.race.snapshot(),
            all_connections: self.all_connection_ids(),
        })
    }

    /// レースの進捗を更新する（未参加なら `None`）
    pub fn update_race_progress(
        &mut self,
        id: &ConnectionId,
        progress: Progress,
        wpm: f64,
        accuracy: f64,
    ) -> Option<RaceProgressOutcome> {
        let winner = self.race.update_progress(id, progress, wpm, accuracy)?;
        Some(RaceProgressOutcome {
            winner,
            players: self.race.snapshot(),
            all_connections: self.all_connection_ids(),
        })
    }

    // ----- 切断 -----

    /// 接続の後片付けをまとめて行う
    ///
    /// 順序: マッチングキュー → レース → タイピング中状態 → ルーム退出 →
    /// 接続レジストリ。二度目の呼び出しは何もしない（`was_registered: false`）。
    pub fn disconnect(&mut self, id: &ConnectionId) -> DisconnectOutcome {
        if !self.connections.contains_key(id) {
            return DisconnectOutcome {
                was_registered: false,
                username: None,
                race_players: None,
                typing_clears: Vec::new(),
                departures: Vec::new(),
                online_count: self.connections.len(),
                online_users: self.online_users(),
                remaining_connections: self.all_connection_ids(),
            };
        }

        // 1. マッチングキューから外す（通知なし）
        self.match_queue.retain(|queued| queued != id);

        // 2. レースから外す
        let race_players = self.race.remove(id).then(|| self.race.snapshot());

        // 3. タイピング中状態を解除する
        let mut cleared_scopes: Vec<Option<RoomId>> = Vec::new();
        self.typing.retain(|scope, entries| {
            if entries.remove(id).is_some() {
                cleared_scopes.push(scope.clone());
            }
            !entries.is_empty()
        });
        let typing_clears: Vec<StaleTypingEntry> = cleared_scopes
            .into_iter()
            .map(|room| StaleTypingEntry {
                connection_id: id.clone(),
                targets: self.typing_targets(room.as_ref(), id),
                room,
            })
            .collect();

        // 4. 参加中の全ルームから退出する（ルーム ID 順）
        let display_name = self.display_name_of(id);
        let mut member_rooms: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.is_member(id))
            .map(|room| room.id.clone())
            .collect();
        member_rooms.sort();

        let mut departures = Vec::new();
        for room_id in member_rooms {
            let Some(room) = self.rooms.get_mut(&room_id) else {
                continue;
            };
            room.remove_member(id);
            let kind = room.kind;
            let remaining = room.members.clone();
            let room_deleted = room.is_empty();
            if room_deleted {
                self.rooms.remove(&room_id);
            }
            departures.push(RoomDeparture {
                room_id,
                kind,
                display_name: display_name.clone(),
                remaining_members: self.member_infos(&remaining),
                remaining,
                room_deleted,
            });
        }

        // 5. 接続レジストリから削除する
        let username = self
            .connections
            .remove(id)
            .and_then(|conn| conn.username);

        DisconnectOutcome {
            was_registered: true,
            username,
            race_players,
            typing_clears,
            departures,
            online_count: self.connections.len(),
            online_users: self.online_users(),
            remaining_connections: self.all_connection_ids(),
        }
    }

    // ----- 照会 -----

    /// アクティブなルームの概要（ルーム ID 順）
    pub fn rooms_summary(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .values()
            .map(|room| RoomSummary {
                room_id: room.id.clone(),
                kind: room.kind,
                member_count: room.member_count(),
                created_by: room.created_by.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.connections.len(),
            rooms: self.rooms.len(),
            race_players: self.race.player_count(),
            match_queue: self.match_queue.len(),
        }
    }

    // ----- 内部ヘルパ -----

    fn display_name_of(&self, id: &ConnectionId) -> String {
        self.connections
            .get(id)
            .map(|conn| conn.display_name())
            .unwrap_or_else(|| id.placeholder_name())
    }

    fn member_infos(&self, ids: &[ConnectionId]) -> Vec<RoomMemberInfo> {
        ids.iter()
            .map(|id| RoomMemberInfo {
                id: id.clone(),
                username: self.display_name_of(id),
            })
            .collect()
    }

    /// タイピング通知の宛先（本人を除く、スコープ内の全接続）
    fn typing_targets(&self, room: Option<&RoomId>, exclude: &ConnectionId) -> Vec<ConnectionId> {
        match room {
            Some(room_id) => self
                .rooms
                .get(room_id)
                .map(|room| {
                    room.members
                        .iter()
                        .filter(|member| *member != exclude)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            None => self
                .connections
                .keys()
                .filter(|connection| *connection != exclude)
                .cloned()
                .collect(),
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Hub 集約の各操作（参加・退出・宛先解決・マッチング・レース・切断）
    // - 参加/退出の繰り返し後のメンバー集合の一致
    // - 切断時の後片付けの網羅性
    //
    // 【なぜこのテストが必要か】
    // - Hub は全イベントの状態遷移を一手に引き受ける集約であり、
    //   ここでの取りこぼしはゴースト参加者・幽霊ルームの原因になる
    // - 通知先スナップショットは状態遷移と同時に取る必要がある
    //
    // 【どのようなシナリオをテストするか】
    // 1. 正常系: 各操作の成立と Outcome の内容
    // 2. 異常系: パスコード不一致・存在しないルーム・非メンバー操作
    // 3. エッジケース: 空ルームの削除、再参加、二重切断
    // ========================================

    fn connection_id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn username(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn passcode(value: &str) -> Passcode {
        Passcode::new(value.to_string()).unwrap()
    }

    fn hub_with_connections(ids: &[&str]) -> Hub {
        let mut hub = Hub::new();
        for id in ids {
            hub.register_connection(connection_id(id), Timestamp::new(0));
        }
        hub
    }

    #[test]
    fn test_register_connection_counts() {
        // テスト項目: 接続登録でオンライン人数が増える
        // given (前提条件):
        let mut hub = Hub::new();

        // when (操作):
        let outcome = hub.register_connection(connection_id("c1"), Timestamp::new(0));

        // then (期待する結果):
        assert_eq!(outcome.online_count, 1);
        assert_eq!(outcome.all_connections, vec![connection_id("c1")]);
    }

    #[test]
    fn test_online_users_only_named_connections() {
        // テスト項目: オンライン一覧にはユーザー名を名乗った接続だけが載る
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);

        // when (操作): c1 だけが join してユーザー名を名乗る
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );

        // then (期待する結果):
        let users = hub.online_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, connection_id("c1"));
        assert_eq!(users[0].name, username("alice"));
    }

    #[test]
    fn test_join_public_room_creates_room_and_notifies_others() {
        // テスト項目: 公開ルーム参加でルームが作られ、既存メンバーが通知先になる
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );

        // when (操作):
        let outcome = hub
            .join_public_room(
                &connection_id("c2"),
                room_id("general"),
                username("bob"),
                Timestamp::new(1),
            )
            .unwrap();

        // then (期待する結果):
        assert!(outcome.joined_room);
        assert!(outcome.newly_joined);
        assert_eq!(outcome.other_members, vec![connection_id("c1")]);
        assert!(outcome.previous_room.is_none());
    }

    #[test]
    fn test_join_public_room_auto_leaves_previous() {
        // テスト項目: 別の公開ルームへの参加で直前のルームから自動退出する
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );
        hub.join_public_room(
            &connection_id("c2"),
            room_id("general"),
            username("bob"),
            Timestamp::new(0),
        );

        // when (操作): c1 が別ルームへ移動
        let outcome = hub
            .join_public_room(
                &connection_id("c1"),
                room_id("games"),
                username("alice"),
                Timestamp::new(1),
            )
            .unwrap();

        // then (期待する結果): 退出情報に残メンバーが入る
        let previous = outcome.previous_room.unwrap();
        assert_eq!(previous.room_id, room_id("general"));
        assert_eq!(previous.remaining, vec![connection_id("c2")]);
    }

    #[test]
    fn test_join_public_room_empty_previous_room_is_deleted() {
        // テスト項目: 自動退出で空になった公開ルームは削除される
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );

        // when (操作):
        hub.join_public_room(
            &connection_id("c1"),
            room_id("games"),
            username("alice"),
            Timestamp::new(1),
        );

        // then (期待する結果): general は消え、games だけが残る
        let summaries = hub.rooms_summary();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].room_id, room_id("games"));
    }

    #[test]
    fn test_join_public_room_rejoin_same_room_is_idempotent() {
        // テスト項目: 同じルームへの再 join でメンバーが重複しない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );

        // when (操作):
        let outcome = hub
            .join_public_room(
                &connection_id("c1"),
                room_id("general"),
                username("alice"),
                Timestamp::new(1),
            )
            .unwrap();

        // then (期待する結果):
        assert!(!outcome.newly_joined);
        assert_eq!(hub.rooms_summary()[0].member_count, 1);
    }

    #[test]
    fn test_join_public_room_rejects_private_room_id() {
        // テスト項目: プライベートルームと同名の公開 join は成立しない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作): c2 がパスコードなしで同名ルームへ join を試みる
        let outcome = hub
            .join_public_room(
                &connection_id("c2"),
                room_id("secret"),
                username("bob"),
                Timestamp::new(1),
            )
            .unwrap();

        // then (期待する結果): 参加は不成立、ただし名乗りは有効
        assert!(!outcome.joined_room);
        assert_eq!(hub.rooms_summary()[0].member_count, 1);
        assert_eq!(hub.online_users().len(), 2);
    }

    #[test]
    fn test_create_private_room_collision() {
        // テスト項目: 既存ルーム ID でのプライベートルーム作成は拒否される
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );

        // when (操作): 公開ルームと同名で作成を試みる
        let result = hub.create_private_room(
            &connection_id("c2"),
            room_id("general"),
            passcode("pass"),
            username("bob"),
            Timestamp::new(1),
        );

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::RoomAlreadyExists));
    }

    #[test]
    fn test_join_private_room_success_and_member_list() {
        // テスト項目: 正しいパスコードで参加でき、メンバー一覧が参加順になる
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        let outcome = hub
            .join_private_room(
                &connection_id("c2"),
                &room_id("secret"),
                &passcode("pass"),
                Some(username("bob")),
            )
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.joiner_name, "bob");
        let names: Vec<&str> = outcome
            .members
            .iter()
            .map(|member| member.username.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_join_private_room_invalid_passcode() {
        // テスト項目: パスコード不一致で InvalidPasscode になる
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        let result = hub.join_private_room(
            &connection_id("c2"),
            &room_id("secret"),
            &passcode("wrong"),
            Some(username("bob")),
        );

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomError::InvalidPasscode);
    }

    #[test]
    fn test_join_private_room_not_found() {
        // テスト項目: 存在しないルームへの参加は RoomNotFound になる
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);

        // when (操作):
        let result = hub.join_private_room(
            &connection_id("c1"),
            &room_id("nowhere"),
            &passcode("pass"),
            None,
        );

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomError::RoomNotFound);
    }

    #[test]
    fn test_join_private_room_without_username_uses_placeholder() {
        // テスト項目: ユーザー名なしの参加ではプレースホルダ名が使われる
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "conn-5678"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        let outcome = hub
            .join_private_room(
                &connection_id("conn-5678"),
                &room_id("secret"),
                &passcode("pass"),
                None,
            )
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.joiner_name, "User5678");
    }

    #[test]
    fn test_leave_private_room_deletes_empty_room() {
        // テスト項目: 最後のメンバー退出でプライベートルームが削除される
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        let outcome = hub
            .leave_private_room(&connection_id("c1"), &room_id("secret"))
            .unwrap();

        // then (期待する結果): ルームは消え、再参加は RoomNotFound
        assert!(outcome.room_deleted);
        assert!(outcome.remaining.is_empty());
        let rejoin = hub.join_private_room(
            &connection_id("c1"),
            &room_id("secret"),
            &passcode("pass"),
            None,
        );
        assert_eq!(rejoin.unwrap_err(), RoomError::RoomNotFound);
    }

    #[test]
    fn test_leave_private_room_non_member_is_noop() {
        // テスト項目: 非メンバーの退出要求は何もしない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        let outcome = hub.leave_private_room(&connection_id("c2"), &room_id("secret"));

        // then (期待する結果):
        assert!(outcome.is_none());
        assert_eq!(hub.rooms_summary()[0].member_count, 1);
    }

    #[test]
    fn test_membership_matches_join_leave_replay() {
        // テスト項目: 参加/退出を繰り返した後のメンバー集合が履歴の再生結果と一致する
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2", "c3"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作): c2 参加 → c3 参加 → c2 退出 → c2 再参加
        hub.join_private_room(
            &connection_id("c2"),
            &room_id("secret"),
            &passcode("pass"),
            Some(username("bob")),
        )
        .unwrap();
        hub.join_private_room(
            &connection_id("c3"),
            &room_id("secret"),
            &passcode("pass"),
            Some(username("carol")),
        )
        .unwrap();
        hub.leave_private_room(&connection_id("c2"), &room_id("secret"));
        let outcome = hub
            .join_private_room(
                &connection_id("c2"),
                &room_id("secret"),
                &passcode("pass"),
                None,
            )
            .unwrap();

        // then (期待する結果): {c1, c3, c2} が参加順で並ぶ
        let ids: Vec<&str> = outcome
            .members
            .iter()
            .map(|member| member.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c1", "c3", "c2"]);
    }

    #[test]
    fn test_meeting_join_reports_existing_participants() {
        // テスト項目: ミーティング参加で既存参加者（本人以外）が返される
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        let user1 = serde_json::json!({ "name": "alice" });
        hub.join_meeting_room(
            &connection_id("c1"),
            room_id("meeting-1"),
            Some(user1.clone()),
            Timestamp::new(0),
        );

        // when (操作):
        let outcome = hub
            .join_meeting_room(
                &connection_id("c2"),
                room_id("meeting-1"),
                Some(serde_json::json!({ "name": "bob" })),
                Timestamp::new(1),
            )
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.existing.len(), 1);
        assert_eq!(outcome.existing[0].id, connection_id("c1"));
        assert_eq!(outcome.existing[0].user, Some(user1));
    }

    #[test]
    fn test_meeting_leave_deletes_empty_room() {
        // テスト項目: 全員退出でミーティングルームが消える
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);
        hub.join_meeting_room(
            &connection_id("c1"),
            room_id("meeting-1"),
            None,
            Timestamp::new(0),
        );

        // when (操作):
        let outcome = hub
            .leave_meeting_room(&connection_id("c1"), &room_id("meeting-1"))
            .unwrap();

        // then (期待する結果):
        assert!(outcome.remaining.is_empty());
        assert!(hub.rooms_summary().is_empty());
    }

    #[test]
    fn test_public_message_requires_username_and_room() {
        // テスト項目: 名乗りと参加ルームが無ければ公開メッセージの宛先は解決されない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);

        // when (操作) / then (期待する結果): join 前は None
        assert!(hub.public_message_targets(&connection_id("c1")).is_none());

        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );
        let outcome = hub.public_message_targets(&connection_id("c1")).unwrap();
        assert_eq!(outcome.username, username("alice"));
        assert_eq!(outcome.room_id, room_id("general"));
        assert_eq!(outcome.targets, vec![connection_id("c1")]);
    }

    #[test]
    fn test_private_message_targets_rejects_non_member() {
        // テスト項目: 非メンバーのプライベートメッセージは NotAMember になる
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        let result = hub.private_message_targets(&connection_id("c2"), &room_id("secret"));

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomError::NotAMember);
    }

    #[test]
    fn test_file_notice_requires_username() {
        // テスト項目: ユーザー名未設定のファイル通知は MissingIdentity になる
        // given (前提条件):
        let hub = hub_with_connections(&["c1"]);

        // when (操作):
        let result = hub.file_notice_targets(&connection_id("c1"), &room_id("general"), false);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), FileNoticeError::MissingIdentity);
    }

    #[test]
    fn test_file_notice_private_room_validation() {
        // テスト項目: プライベートファイル通知はメンバーのみ、公開通知は参加ルームのみ
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();
        hub.join_public_room(
            &connection_id("c2"),
            room_id("general"),
            username("bob"),
            Timestamp::new(0),
        );

        // when (操作) / then (期待する結果):
        let ok = hub.file_notice_targets(&connection_id("c1"), &room_id("secret"), true);
        assert_eq!(ok.unwrap().targets, vec![connection_id("c1")]);

        let not_member = hub.file_notice_targets(&connection_id("c2"), &room_id("secret"), true);
        assert_eq!(not_member.unwrap_err(), FileNoticeError::NotInPrivateRoom);

        let not_in_room = hub.file_notice_targets(&connection_id("c1"), &room_id("general"), false);
        assert_eq!(not_in_room.unwrap_err(), FileNoticeError::NotInRoom);
    }

    #[test]
    fn test_typing_global_scope_targets_everyone_else() {
        // テスト項目: 全体スコープのタイピング通知は本人以外の全接続に届く
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2", "c3"]);

        // when (操作):
        let outcome = hub
            .set_typing(&connection_id("c1"), None, Timestamp::new(100))
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.targets.len(), 2);
        assert!(!outcome.targets.contains(&connection_id("c1")));
    }

    #[test]
    fn test_typing_room_scope_requires_membership() {
        // テスト項目: ルームスコープのタイピングはメンバーのみ有効
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作) / then (期待する結果):
        let non_member = hub.set_typing(
            &connection_id("c2"),
            Some(room_id("secret")),
            Timestamp::new(100),
        );
        assert!(non_member.is_none());

        let member = hub
            .set_typing(
                &connection_id("c1"),
                Some(room_id("secret")),
                Timestamp::new(100),
            )
            .unwrap();
        assert!(member.targets.is_empty()); // ルームには本人しかいない
    }

    #[test]
    fn test_sweep_stale_typing() {
        // テスト項目: TTL を超えたタイピング中状態だけが失効する
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2", "c3"]);
        hub.set_typing(&connection_id("c1"), None, Timestamp::new(0));
        hub.set_typing(&connection_id("c2"), None, Timestamp::new(4_000));

        // when (操作): TTL 5 秒、時刻 5 秒で掃除
        let stale = hub.sweep_stale_typing(Timestamp::new(5_000), 5_000);

        // then (期待する結果): c1 だけが失効し、c2 は残る
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].connection_id, connection_id("c1"));
        assert_eq!(stale[0].room, None);
        assert!(!stale[0].targets.contains(&connection_id("c1")));

        let second = hub.sweep_stale_typing(Timestamp::new(5_000), 5_000);
        assert!(second.is_empty());
    }

    #[test]
    fn test_refresh_keeps_typing_alive() {
        // テスト項目: typing の再送で最終更新時刻が更新され、失効しない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.set_typing(&connection_id("c1"), None, Timestamp::new(0));
        hub.set_typing(&connection_id("c1"), None, Timestamp::new(4_000));

        // when (操作):
        let stale = hub.sweep_stale_typing(Timestamp::new(5_000), 5_000);

        // then (期待する結果):
        assert!(stale.is_empty());
    }

    #[test]
    fn test_match_queue_pairs_in_fifo_order() {
        // テスト項目: キューが 2 人揃った時点で先頭からペアが成立する
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2", "c3"]);

        // when (操作):
        let first = hub.enqueue_for_match(&connection_id("c1"));
        let second = hub.enqueue_for_match(&connection_id("c2"));
        let third = hub.enqueue_for_match(&connection_id("c3"));

        // then (期待する結果): c1-c2 がペアになり、c3 は待機
        assert!(first.is_none());
        let pair = second.unwrap();
        assert_eq!(pair.first, connection_id("c1"));
        assert_eq!(pair.second, connection_id("c2"));
        assert!(third.is_none());
        assert_eq!(hub.stats().match_queue, 1);
    }

    #[test]
    fn test_match_queue_enqueue_is_idempotent() {
        // テスト項目: 同じ接続の再リクエストでキューが重複しない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);

        // when (操作):
        hub.enqueue_for_match(&connection_id("c1"));
        hub.enqueue_for_match(&connection_id("c1"));

        // then (期待する結果):
        assert_eq!(hub.stats().match_queue, 1);
    }

    #[test]
    fn test_race_join_and_progress() {
        // テスト項目: レース参加で課題文とプレイヤー一覧が返り、進捗更新で勝者が 1 回だけ確定する
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);

        // when (操作):
        let join = hub
            .join_race(&connection_id("c1"), username("alice"))
            .unwrap();
        hub.join_race(&connection_id("c2"), username("bob")).unwrap();

        // then (期待する結果):
        assert_eq!(join.paragraph, RaceSession::DEFAULT_PARAGRAPH);
        assert_eq!(join.players.len(), 1);

        let winner_update = hub
            .update_race_progress(&connection_id("c1"), Progress::new(100.0), 80.0, 96.0)
            .unwrap();
        assert_eq!(winner_update.winner, Some(username("alice")));

        let late_update = hub
            .update_race_progress(&connection_id("c2"), Progress::new(100.0), 85.0, 99.0)
            .unwrap();
        assert_eq!(late_update.winner, None);
    }

    #[test]
    fn test_disconnect_cleans_up_everything() {
        // テスト項目: 切断で キュー・レース・タイピング・ルーム・レジストリが全て掃除される
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );
        hub.join_public_room(
            &connection_id("c2"),
            room_id("general"),
            username("bob"),
            Timestamp::new(0),
        );
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();
        hub.join_race(&connection_id("c1"), username("alice"));
        hub.enqueue_for_match(&connection_id("c1"));
        hub.set_typing(&connection_id("c1"), None, Timestamp::new(0));

        // when (操作):
        let outcome = hub.disconnect(&connection_id("c1"));

        // then (期待する結果):
        assert!(outcome.was_registered);
        assert_eq!(outcome.username, Some(username("alice")));
        assert_eq!(outcome.online_count, 1);
        assert!(outcome.race_players.unwrap().is_empty());
        assert_eq!(outcome.typing_clears.len(), 1);

        // ルーム退出はルーム ID 順: general → secret
        assert_eq!(outcome.departures.len(), 2);
        assert_eq!(outcome.departures[0].room_id, room_id("general"));
        assert_eq!(outcome.departures[0].remaining, vec![connection_id("c2")]);
        assert!(!outcome.departures[0].room_deleted);
        assert_eq!(outcome.departures[1].room_id, room_id("secret"));
        assert!(outcome.departures[1].room_deleted);

        // 統計からも消えている
        let stats = hub.stats();
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.rooms, 1);
        assert_eq!(stats.race_players, 0);
        assert_eq!(stats.match_queue, 0);
    }

    #[test]
    fn test_disconnect_twice_is_noop() {
        // テスト項目: 二重切断は何もしない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1"]);
        hub.disconnect(&connection_id("c1"));

        // when (操作):
        let outcome = hub.disconnect(&connection_id("c1"));

        // then (期待する結果):
        assert!(!outcome.was_registered);
        assert_eq!(outcome.online_count, 0);
    }

    #[test]
    fn test_disconnect_deletes_emptied_private_room() {
        // テスト項目: 切断で空になったプライベートルームは削除され、再参加できない
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.create_private_room(
            &connection_id("c1"),
            room_id("secret"),
            passcode("pass"),
            username("alice"),
            Timestamp::new(0),
        )
        .unwrap();

        // when (操作):
        hub.disconnect(&connection_id("c1"));

        // then (期待する結果):
        let result = hub.join_private_room(
            &connection_id("c2"),
            &room_id("secret"),
            &passcode("pass"),
            Some(username("bob")),
        );
        assert_eq!(result.unwrap_err(), RoomError::RoomNotFound);
    }

    #[test]
    fn test_stats_snapshot() {
        // テスト項目: stats が各コンポーネントの件数を返す
        // given (前提条件):
        let mut hub = hub_with_connections(&["c1", "c2"]);
        hub.join_public_room(
            &connection_id("c1"),
            room_id("general"),
            username("alice"),
            Timestamp::new(0),
        );
        hub.join_race(&connection_id("c2"), username("bob"));
        hub.enqueue_for_match(&connection_id("c1"));

        // when (操作):
        let stats = hub.stats();

        // then (期待する結果):
        assert_eq!(
            stats,
            HubStats {
                connections: 2,
                rooms: 1,
                race_players: 1,
                match_queue: 1,
            }
        );
    }
}
