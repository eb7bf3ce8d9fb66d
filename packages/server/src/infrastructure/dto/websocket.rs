//! WebSocket message DTOs.
//!
//! Everything on the wire is an internally tagged JSON object: the `type`
//! field names the event, the remaining fields are the payload. Event and
//! field names follow the reference client verbatim (camelCase fields,
//! a mix of camelCase / kebab-case / snake_case event names).
//!
//! `ClientEvent` is what connections send to the hub, `ServerEvent` is what
//! the hub pushes back. The client crate reuses both for its own wire I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Inbound (client → server)
// ========================================

/// Events a connected client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Join a public chat room (sets the username).
    Join { username: String, room: String },
    /// Chat message to the current public room.
    SendMessage { text: String },
    /// Create a passcode-protected private room.
    CreatePrivateRoom {
        room_id: String,
        passcode: String,
        username: String,
    },
    /// Join an existing private room.
    JoinPrivateRoom {
        room_id: String,
        passcode: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
    /// Leave a private room.
    LeavePrivateRoom { room_id: String },
    /// Chat message to a private room.
    PrivateMessage { room_id: String, message: String },
    /// Typing indicator; `room` scopes it to one room, otherwise global.
    Typing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    /// Clear the typing indicator.
    StopTyping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    /// Join a meeting room; `user` is an opaque client-defined profile.
    #[serde(rename = "join-meeting")]
    JoinMeeting {
        meeting_id: String,
        #[serde(default)]
        user: Option<Value>,
    },
    /// Leave a meeting room.
    #[serde(rename = "leave-meeting")]
    LeaveMeeting { meeting_id: String },
    /// Chat message inside a meeting.
    #[serde(rename = "chat-message")]
    ChatMessage {
        meeting_id: String,
        message: String,
        #[serde(default)]
        user: Option<Value>,
    },
    /// Notify a meeting that a recording URL is ready.
    #[serde(rename = "recording-available")]
    RecordingAvailable { meeting_id: String, url: String },
    /// WebRTC SDP offer relayed to one meeting participant.
    #[serde(rename = "webrtc-offer")]
    WebrtcOffer { to: String, sdp: Value },
    /// WebRTC SDP answer relayed to one meeting participant.
    #[serde(rename = "webrtc-answer")]
    WebrtcAnswer { to: String, sdp: Value },
    /// WebRTC ICE candidate relayed to one meeting participant.
    #[serde(rename = "webrtc-ice")]
    WebrtcIce { to: String, candidate: Value },
    /// 1:1 call offer.
    #[serde(rename = "call-offer")]
    CallOffer { to: String, offer: Value },
    /// 1:1 call answer.
    #[serde(rename = "call-answer")]
    CallAnswer { to: String, answer: Value },
    /// 1:1 call ICE candidate; an absent candidate is silently ignored.
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        to: String,
        #[serde(default)]
        candidate: Option<Value>,
    },
    /// Hang up a 1:1 call.
    #[serde(rename = "end-call")]
    EndCall { to: String },
    /// Enter the random 1:1 match queue.
    #[serde(rename = "random-match-request")]
    RandomMatchRequest,
    /// Join the typing race (sets the username).
    JoinRace { username: String },
    /// Typing race progress report; wpm/accuracy are client-computed.
    ProgressUpdate {
        progress: f64,
        #[serde(default)]
        wpm: f64,
        #[serde(default)]
        accuracy: f64,
    },
    /// Ask for the current online users list.
    #[serde(rename = "request-online-list")]
    RequestOnlineList,
    /// Notify a room that a file was uploaded to the file service.
    #[serde(rename = "notify_file_upload")]
    NotifyFileUpload {
        room_id: String,
        file_info: Value,
        #[serde(default)]
        is_private: bool,
    },
}

// ========================================
// Outbound (server → client)
// ========================================

/// An entry of the global online users list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineUserInfo {
    pub id: String,
    pub name: String,
}

/// A private room member as shown in `privateRoomUsers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateRoomMember {
    pub id: String,
    pub username: String,
}

/// A meeting participant with the opaque profile from `join-meeting`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: String,
    pub user: Option<Value>,
}

/// One typing race player, keyed by connection id in `updatePlayers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub username: String,
    pub progress: f64,
    pub wpm: f64,
    pub accuracy: f64,
}

/// Events the hub pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First event on every connection: the id the hub assigned.
    Connected { id: String },
    /// Public room chat message (also used for Admin notices).
    Message {
        user: String,
        text: String,
        time: String,
        id: String,
    },
    /// Private room chat message.
    PrivateMessage {
        room_id: String,
        user_id: String,
        username: String,
        message: String,
        time: String,
        id: String,
    },
    /// Meeting chat message.
    #[serde(rename = "chat-message")]
    ChatMessage {
        message: String,
        user: Option<Value>,
        time: String,
        id: String,
    },
    /// Number of open connections.
    OnlineUsersCount { count: usize },
    /// Users that have announced a username.
    OnlineUsersList { users: Vec<OnlineUserInfo> },
    /// Someone is typing.
    Typing {
        user_id: String,
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    /// Someone stopped typing (or their indicator went stale).
    StopTyping {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    /// Reply to `join-meeting`: participants already in the meeting.
    Participants { participants: Vec<ParticipantInfo> },
    /// A participant joined the meeting.
    #[serde(rename = "peer-joined")]
    PeerJoined { id: String, user: Option<Value> },
    /// A participant left the meeting.
    #[serde(rename = "peer-left")]
    PeerLeft { id: String },
    /// Relayed SDP offer, annotated with the sender's meeting profile.
    #[serde(rename = "webrtc-offer")]
    WebrtcOffer {
        from: String,
        sdp: Value,
        user: Option<Value>,
    },
    /// Relayed SDP answer.
    #[serde(rename = "webrtc-answer")]
    WebrtcAnswer { from: String, sdp: Value },
    /// Relayed ICE candidate (meeting flavor).
    #[serde(rename = "webrtc-ice")]
    WebrtcIce { from: String, candidate: Value },
    /// Relayed 1:1 call offer.
    #[serde(rename = "call-offer")]
    CallOffer { from: String, offer: Value },
    /// Relayed 1:1 call answer.
    #[serde(rename = "call-answer")]
    CallAnswer { from: String, answer: Value },
    /// Relayed 1:1 ICE candidate.
    #[serde(rename = "ice-candidate")]
    IceCandidate { from: String, candidate: Value },
    /// The peer hung up.
    #[serde(rename = "call-ended")]
    CallEnded { from: String },
    /// A random match was made; `room_id` is the pairing label.
    #[serde(rename = "random-match-found")]
    RandomMatchFound { room_id: String, other_id: String },
    /// The typing race paragraph, sent to a joiner.
    Paragraph { text: String },
    /// Full typing race scoreboard, keyed by connection id.
    UpdatePlayers { players: BTreeMap<String, PlayerState> },
    /// Someone finished the race first.
    Winner { username: String },
    /// Ack for `createPrivateRoom`.
    PrivateRoomCreated {
        success: bool,
        room_id: String,
        message: String,
    },
    /// Ack for `joinPrivateRoom`.
    JoinPrivateRoomResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Current member list of a private room.
    PrivateRoomUsers {
        room_id: String,
        users: Vec<PrivateRoomMember>,
    },
    /// Someone joined a private room.
    UserJoinedPrivate {
        room_id: String,
        user_id: String,
        username: String,
        message: String,
        time: String,
    },
    /// Someone left a private room (or disconnected).
    UserLeftPrivate {
        room_id: String,
        user_id: String,
        username: String,
        message: String,
        time: String,
    },
    /// File shared in a public room.
    #[serde(rename = "file_uploaded")]
    FileUploaded {
        user_id: String,
        username: String,
        file: Value,
        time: String,
        id: String,
    },
    /// File shared in a private room.
    PrivateFileUploaded {
        room_id: String,
        user_id: String,
        username: String,
        file: Value,
        time: String,
        id: String,
    },
    /// Ack for a rejected `notify_file_upload`.
    #[serde(rename = "file_upload_error")]
    FileUploadError { message: String },
    /// Generic error ack to the initiating client.
    Error { message: String },
    /// A meeting recording URL became available.
    #[serde(rename = "recording-available")]
    RecordingAvailable { url: String },
}

impl ServerEvent {
    /// Serialize for the wire.
    ///
    /// Serialization of these variants cannot fail (no non-string map keys,
    /// no fallible Serialize impls), so the result is unwrapped here once
    /// instead of at every push site.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
