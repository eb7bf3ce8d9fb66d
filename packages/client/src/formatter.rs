//! Message formatting utilities for client display.

use std::collections::BTreeMap;

use idobata_server::infrastructure::dto::websocket::{
    OnlineUserInfo, PlayerState, PrivateRoomMember, ServerEvent,
};

const SECTION_LINE: &str = "============================================================";
const MESSAGE_LINE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render one hub event for the terminal.
    ///
    /// Returns `None` for events this client has no display for
    /// (signaling relays, meeting traffic, stop-typing).
    pub fn format_event(event: &ServerEvent, current_user: &str) -> Option<String> {
        match event {
            ServerEvent::Connected { id } => Some(format!("\nConnected as '{}'\n", id)),
            ServerEvent::Message {
                user, text, time, ..
            } => Some(Self::format_chat_message(user, text, time)),
            ServerEvent::PrivateMessage {
                room_id,
                username,
                message,
                time,
                ..
            } => Some(Self::format_private_message(room_id, username, message, time)),
            ServerEvent::OnlineUsersCount { count } => {
                Some(format!("\n* {} user(s) online\n", count))
            }
            ServerEvent::OnlineUsersList { users } => {
                Some(Self::format_online_users(users, current_user))
            }
            ServerEvent::Typing { username, room, .. } => {
                Some(Self::format_typing(username, room.as_deref()))
            }
            ServerEvent::RandomMatchFound { room_id, other_id } => {
                Some(format!("\n* Matched with {} (room {})\n", other_id, room_id))
            }
            ServerEvent::Paragraph { text } => Some(Self::format_paragraph(text)),
            ServerEvent::UpdatePlayers { players } => Some(Self::format_scoreboard(players)),
            ServerEvent::Winner { username } => {
                Some(format!("\n*** {} wins the race! ***\n", username))
            }
            ServerEvent::PrivateRoomCreated {
                success,
                room_id,
                message,
            } => {
                if *success {
                    Some(format!("\n+ {} (room '{}')\n", message, room_id))
                } else {
                    Some(format!("\n! {}\n", message))
                }
            }
            ServerEvent::JoinPrivateRoomResult { success, message } => {
                if *success {
                    Some("\n+ Joined the private room\n".to_string())
                } else {
                    Some(format!(
                        "\n! {}\n",
                        message.as_deref().unwrap_or("Could not join the room")
                    ))
                }
            }
            ServerEvent::PrivateRoomUsers { room_id, users } => {
                Some(Self::format_private_room_users(room_id, users))
            }
            ServerEvent::UserJoinedPrivate { message, time, .. } => {
                Some(format!("\n+ {} ({})\n", message, time))
            }
            ServerEvent::UserLeftPrivate { message, time, .. } => {
                Some(format!("\n- {} ({})\n", message, time))
            }
            ServerEvent::FileUploaded {
                username, file, ..
            } => {
                let name = file.get("name").and_then(|v| v.as_str()).unwrap_or("a file");
                Some(format!("\n* {} shared {}\n", username, name))
            }
            ServerEvent::PrivateFileUploaded {
                room_id,
                username,
                file,
                ..
            } => {
                let name = file.get("name").and_then(|v| v.as_str()).unwrap_or("a file");
                Some(format!("\n* [{}] {} shared {}\n", room_id, username, name))
            }
            ServerEvent::FileUploadError { message } | ServerEvent::Error { message } => {
                Some(format!("\n! {}\n", message))
            }
            ServerEvent::StopTyping { .. }
            | ServerEvent::ChatMessage { .. }
            | ServerEvent::Participants { .. }
            | ServerEvent::PeerJoined { .. }
            | ServerEvent::PeerLeft { .. }
            | ServerEvent::WebrtcOffer { .. }
            | ServerEvent::WebrtcAnswer { .. }
            | ServerEvent::WebrtcIce { .. }
            | ServerEvent::CallOffer { .. }
            | ServerEvent::CallAnswer { .. }
            | ServerEvent::IceCandidate { .. }
            | ServerEvent::CallEnded { .. }
            | ServerEvent::RecordingAvailable { .. } => None,
        }
    }

    /// Format a chat message (also used for Admin notices)
    ///
    /// # Arguments
    ///
    /// * `user` - The display name of the sender
    /// * `text` - The message content
    /// * `time` - The server-stamped time string
    ///
    /// # Returns
    ///
    /// A formatted string with the chat message
    pub fn format_chat_message(user: &str, text: &str, time: &str) -> String {
        format!(
            "\n\n{line}\n@{user}: {text}\nsent at {time}\n{line}\n",
            line = MESSAGE_LINE,
            user = user,
            text = text,
            time = time
        )
    }

    /// Format a private room chat message
    pub fn format_private_message(
        room_id: &str,
        username: &str,
        message: &str,
        time: &str,
    ) -> String {
        format!(
            "\n\n{line}\n[{room}] @{user}: {message}\nsent at {time}\n{line}\n",
            line = MESSAGE_LINE,
            room = room_id,
            user = username,
            message = message,
            time = time
        )
    }

    /// Format the online users list, marking the current user
    ///
    /// # Arguments
    ///
    /// * `users` - Users that have announced a username
    /// * `current_user` - The current user's name (to mark as "me")
    pub fn format_online_users(users: &[OnlineUserInfo], current_user: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", SECTION_LINE));
        output.push_str("Online users:\n");

        if users.is_empty() {
            output.push_str("(No users)\n");
        } else {
            for user in users {
                let me_suffix = if user.name == current_user { " (me)" } else { "" };
                output.push_str(&format!("{}{}\n", user.name, me_suffix));
            }
        }

        output.push_str(&format!("{}\n", SECTION_LINE));
        output
    }

    /// Format a typing indicator, scoped to a room when one is named
    pub fn format_typing(username: &str, room: Option<&str>) -> String {
        match room {
            Some(room) => format!("\n* [{}] {} is typing...\n", room, username),
            None => format!("\n* {} is typing...\n", username),
        }
    }

    /// Format the member list of a private room
    pub fn format_private_room_users(room_id: &str, users: &[PrivateRoomMember]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", SECTION_LINE));
        output.push_str(&format!("[{}] Members:\n", room_id));
        for user in users {
            output.push_str(&format!("{}\n", user.username));
        }
        output.push_str(&format!("{}\n", SECTION_LINE));
        output
    }

    /// Format the typing race paragraph
    pub fn format_paragraph(text: &str) -> String {
        format!(
            "\n\n{line}\nRace paragraph:\n{text}\n{hint}\n{line}\n",
            line = SECTION_LINE,
            text = text,
            hint = "(report with /progress <pct> [wpm] [accuracy])"
        )
    }

    /// Format the race scoreboard, one player per line
    pub fn format_scoreboard(players: &BTreeMap<String, PlayerState>) -> String {
        let mut output = String::new();
        output.push_str("\n\nRace standings:\n");
        for player in players.values() {
            output.push_str(&format!(
                "  {}: {:.1}% ({:.0} wpm, {:.0}% accuracy)\n",
                player.username, player.progress, player.wpm, player.accuracy
            ));
        }
        output
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが送信者・本文・時刻付きで整形される
        // given (前提条件):
        let user = "alice";
        let text = "Hello, world!";
        let time = "14:05:30";

        // when (操作):
        let result = MessageFormatter::format_chat_message(user, text, time);

        // then (期待する結果):
        assert!(result.contains("@alice:"));
        assert!(result.contains("Hello, world!"));
        assert!(result.contains("sent at 14:05:30"));
        assert!(result.contains(MESSAGE_LINE));
    }

    #[test]
    fn test_format_private_message_names_the_room() {
        // テスト項目: プライベートメッセージにルーム名が付く
        // given (前提条件):

        // when (操作):
        let result = MessageFormatter::format_private_message("den", "bob", "psst", "14:05:30");

        // then (期待する結果):
        assert!(result.contains("[den] @bob: psst"));
    }

    #[test]
    fn test_format_online_users_marks_me() {
        // テスト項目: オンライン一覧で自分に (me) が付く
        // given (前提条件):
        let users = vec![
            OnlineUserInfo {
                id: "conn-1".to_string(),
                name: "alice".to_string(),
            },
            OnlineUserInfo {
                id: "conn-2".to_string(),
                name: "bob".to_string(),
            },
        ];

        // when (操作):
        let result = MessageFormatter::format_online_users(&users, "alice");

        // then (期待する結果):
        assert!(result.contains("alice (me)"));
        assert!(result.contains("bob\n"));
        assert!(!result.contains("bob (me)"));
    }

    #[test]
    fn test_format_online_users_empty() {
        // テスト項目: 誰もいない一覧は専用の表示になる
        // given (前提条件):
        let users = vec![];

        // when (操作):
        let result = MessageFormatter::format_online_users(&users, "alice");

        // then (期待する結果):
        assert!(result.contains("(No users)"));
    }

    #[test]
    fn test_format_typing_with_and_without_room() {
        // テスト項目: typing 表示はルームスコープの有無で形が変わる
        // given (前提条件):

        // when (操作):
        let global = MessageFormatter::format_typing("alice", None);
        let scoped = MessageFormatter::format_typing("alice", Some("den"));

        // then (期待する結果):
        assert_eq!(global, "\n* alice is typing...\n");
        assert_eq!(scoped, "\n* [den] alice is typing...\n");
    }

    #[test]
    fn test_format_scoreboard_lists_players() {
        // テスト項目: スコアボードに各プレイヤーの進捗が載る
        // given (前提条件):
        let mut players = BTreeMap::new();
        players.insert(
            "conn-1".to_string(),
            PlayerState {
                username: "alice".to_string(),
                progress: 42.5,
                wpm: 92.0,
                accuracy: 98.4,
            },
        );

        // when (操作):
        let result = MessageFormatter::format_scoreboard(&players);

        // then (期待する結果):
        assert!(result.contains("alice: 42.5% (92 wpm, 98% accuracy)"));
    }

    #[test]
    fn test_format_event_renders_error_ack() {
        // テスト項目: エラー ack が ! 付きで表示される
        // given (前提条件):
        let event = ServerEvent::Error {
            message: "Invalid passcode".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_event(&event, "alice");

        // then (期待する結果):
        assert_eq!(result, Some("\n! Invalid passcode\n".to_string()));
    }

    #[test]
    fn test_format_event_ignores_signaling_traffic() {
        // テスト項目: シグナリング中継と stopTyping は表示されない
        // given (前提条件):
        let offer = ServerEvent::CallOffer {
            from: "conn-1".to_string(),
            offer: json!({"sdp": "x"}),
        };
        let stop = ServerEvent::StopTyping {
            user_id: "conn-1".to_string(),
            room: None,
        };

        // when (操作):

        // then (期待する結果):
        assert!(MessageFormatter::format_event(&offer, "alice").is_none());
        assert!(MessageFormatter::format_event(&stop, "alice").is_none());
    }

    #[test]
    fn test_format_event_file_notice_uses_file_name() {
        // テスト項目: ファイル通知は file.name を表示に使う
        // given (前提条件):
        let event = ServerEvent::FileUploaded {
            user_id: "conn-1".to_string(),
            username: "alice".to_string(),
            file: json!({"name": "notes.pdf", "url": "/files/notes.pdf"}),
            time: "14:05:30".to_string(),
            id: "evt-1".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_event(&event, "bob").unwrap();

        // then (期待する結果):
        assert!(result.contains("alice shared notes.pdf"));
    }

    #[test]
    fn test_format_raw_message() {
        // テスト項目: 解釈できないフレームは生のまま表示される
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let result = MessageFormatter::format_raw_message(text);

        // then (期待する結果):
        assert!(result.contains("unknown message format"));
        assert!(result.contains("Received:"));
    }
}
