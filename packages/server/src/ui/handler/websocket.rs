//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::ConnectionId, infrastructure::dto::websocket::ClientEvent, ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // Use ConnectSessionUseCase to register the connection and assign its id
    // (register_client is called inside the UseCase; the id travels back to
    // the client as the `connected` event)
    let connection_id = state.connect_session_usecase.execute(tx).await;
    tracing::info!("Client '{}' connected and registered", connection_id);

    ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: events addressed to this
/// connection (via rx channel) are sent to its WebSocket.
///
/// # Arguments
///
/// * `rx` - Channel receiver for events addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    // Spawn a task that drains queued events to this client; `connected` and
    // the first `onlineUsersCount` are already waiting in the channel
    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text: {}", text);

                    // Parse the incoming event; unknown or malformed input is
                    // logged and dropped, the connection stays up
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse message as JSON: {}", e);
                            continue;
                        }
                    };

                    dispatch_event(&state_clone, &connection_id_clone, event).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", connection_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Use DisconnectSessionUseCase to tear down every membership of this
    // connection and notify the affected rooms
    state.disconnect_session_usecase.execute(&connection_id).await;
    tracing::info!(
        "Client '{}' disconnected and removed from registry",
        connection_id
    );
}

/// Route one parsed client event to its UseCase.
async fn dispatch_event(state: &Arc<AppState>, connection_id: &ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::Join { username, room } => {
            state
                .join_room_usecase
                .execute(connection_id, username, room)
                .await;
        }
        ClientEvent::SendMessage { text } => {
            state
                .send_message_usecase
                .send_public(connection_id, text)
                .await;
        }
        ClientEvent::CreatePrivateRoom {
            room_id,
            passcode,
            username,
        } => {
            state
                .private_room_usecase
                .create(connection_id, room_id, passcode, username)
                .await;
        }
        ClientEvent::JoinPrivateRoom {
            room_id,
            passcode,
            username,
        } => {
            state
                .private_room_usecase
                .join(connection_id, room_id, passcode, username)
                .await;
        }
        ClientEvent::LeavePrivateRoom { room_id } => {
            state
                .private_room_usecase
                .leave(connection_id, room_id)
                .await;
        }
        ClientEvent::PrivateMessage { room_id, message } => {
            state
                .send_message_usecase
                .send_private(connection_id, room_id, message)
                .await;
        }
        ClientEvent::Typing { room } => {
            state.presence_usecase.set_typing(connection_id, room).await;
        }
        ClientEvent::StopTyping { room } => {
            state
                .presence_usecase
                .clear_typing(connection_id, room)
                .await;
        }
        ClientEvent::JoinMeeting { meeting_id, user } => {
            state
                .meeting_usecase
                .join(connection_id, meeting_id, user)
                .await;
        }
        ClientEvent::LeaveMeeting { meeting_id } => {
            state.meeting_usecase.leave(connection_id, meeting_id).await;
        }
        ClientEvent::ChatMessage {
            meeting_id,
            message,
            user,
        } => {
            state
                .send_message_usecase
                .send_meeting_chat(connection_id, meeting_id, message, user)
                .await;
        }
        ClientEvent::RecordingAvailable { meeting_id, url } => {
            state
                .send_message_usecase
                .relay_recording(meeting_id, url)
                .await;
        }
        ClientEvent::WebrtcOffer { to, sdp } => {
            state
                .signaling_usecase
                .relay_meeting_offer(connection_id, to, sdp)
                .await;
        }
        ClientEvent::WebrtcAnswer { to, sdp } => {
            state
                .signaling_usecase
                .relay_meeting_answer(connection_id, to, sdp)
                .await;
        }
        ClientEvent::WebrtcIce { to, candidate } => {
            state
                .signaling_usecase
                .relay_meeting_ice(connection_id, to, candidate)
                .await;
        }
        ClientEvent::CallOffer { to, offer } => {
            state
                .signaling_usecase
                .relay_call_offer(connection_id, to, offer)
                .await;
        }
        ClientEvent::CallAnswer { to, answer } => {
            state
                .signaling_usecase
                .relay_call_answer(connection_id, to, answer)
                .await;
        }
        ClientEvent::IceCandidate { to, candidate } => {
            state
                .signaling_usecase
                .relay_call_ice(connection_id, to, candidate)
                .await;
        }
        ClientEvent::EndCall { to } => {
            state.signaling_usecase.end_call(connection_id, to).await;
        }
        ClientEvent::RandomMatchRequest => {
            state.matchmaking_usecase.enqueue(connection_id).await;
        }
        ClientEvent::JoinRace { username } => {
            state.typing_race_usecase.join(connection_id, username).await;
        }
        ClientEvent::ProgressUpdate {
            progress,
            wpm,
            accuracy,
        } => {
            state
                .typing_race_usecase
                .update_progress(connection_id, progress, wpm, accuracy)
                .await;
        }
        ClientEvent::RequestOnlineList => {
            state.presence_usecase.send_online_list(connection_id).await;
        }
        ClientEvent::NotifyFileUpload {
            room_id,
            file_info,
            is_private,
        } => {
            state
                .send_message_usecase
                .relay_file_notice(connection_id, room_id, file_info, is_private)
                .await;
        }
    }
}
