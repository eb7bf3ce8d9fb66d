//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use idobata_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::{
    command::{HELP_TEXT, Input, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// Run the WebSocket client session
pub async fn run_client_session(
    url: &str,
    username: &str,
    room: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _response) = match connect_async(url).await {
        Ok(result) => result,
        Err(e) => {
            return Err(Box::new(ClientError::ConnectionError(e.to_string())));
        }
    };

    tracing::info!("Connected to the hub!");
    println!(
        "\nYou are '{}' in room '{}'. Type messages, /help for commands, Ctrl+C to exit.\n",
        username, room
    );

    let (mut write, mut read) = ws_stream.split();

    // Join the chat room right away; the hub answers with the welcome notice
    let join = ClientEvent::Join {
        username: username.to_string(),
        room: room.to_string(),
    };
    write
        .send(Message::Text(serde_json::to_string(&join)?.into()))
        .await?;

    let username_for_read = username.to_string();

    // Spawn a task to handle incoming events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        if let Some(formatted) =
                            MessageFormatter::format_event(&event, &username_for_read)
                        {
                            print!("{}", formatted);
                            redisplay_prompt(&username_for_read);
                        }
                    }
                    // If parsing fails, display as raw text
                    Err(_) => {
                        let formatted = MessageFormatter::format_raw_message(&text);
                        print!("{}", formatted);
                        redisplay_prompt(&username_for_read);
                    }
                },
                Ok(Message::Binary(data)) => {
                    let formatted = MessageFormatter::format_binary_message(data.len());
                    print!("{}", formatted);
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    let prompt_name = username.to_string();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let username_for_write = username.to_string();

    // Spawn a task to turn stdin lines into hub events
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let event = match parse_input(&line, &username_for_write) {
                Input::Event(event) => event,
                Input::Help => {
                    print!("\n{}", HELP_TEXT);
                    redisplay_prompt(&username_for_write);
                    continue;
                }
                Input::Invalid(reason) => {
                    print!("\n! {}\n", reason);
                    redisplay_prompt(&username_for_write);
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send event: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
