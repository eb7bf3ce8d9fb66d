//! Turning stdin lines into hub events.
//!
//! Pure parsing only, so every command form is testable without a
//! connection. Plain lines become chat messages; lines starting with `/`
//! are commands.

use idobata_server::infrastructure::dto::websocket::ClientEvent;

/// Help text shown by `/help` and after an invalid command.
pub(crate) const HELP_TEXT: &str = "\
Commands:
  /join <room>                 switch public chat room
  /create <room> <passcode>    create a private room
  /joinp <room> <passcode>     join a private room
  /leave <room>                leave a private room
  /pm <room> <message>         message a private room
  /race                        join the typing race
  /progress <pct> [wpm] [acc]  report race progress
  /match                       queue for a random 1:1 match
  /who                         list online users
  /help                        show this help
Anything else is sent to the current chat room.
";

/// What one stdin line turned into.
#[derive(Debug, PartialEq)]
pub(crate) enum Input {
    /// Send this event to the hub.
    Event(ClientEvent),
    /// Show the command help locally.
    Help,
    /// The line could not be turned into an event; show the reason.
    Invalid(String),
}

/// Parse one trimmed, non-empty stdin line.
pub(crate) fn parse_input(line: &str, username: &str) -> Input {
    let Some(command_line) = line.strip_prefix('/') else {
        return Input::Event(ClientEvent::SendMessage {
            text: line.to_string(),
        });
    };

    let mut tokens = command_line.split_whitespace();
    let command = tokens.next().unwrap_or("");
    let args: Vec<&str> = tokens.collect();

    match command {
        "help" => Input::Help,
        "join" => match args.as_slice() {
            [room] => Input::Event(ClientEvent::Join {
                username: username.to_string(),
                room: (*room).to_string(),
            }),
            _ => usage("/join <room>"),
        },
        "create" => match args.as_slice() {
            [room, passcode] => Input::Event(ClientEvent::CreatePrivateRoom {
                room_id: (*room).to_string(),
                passcode: (*passcode).to_string(),
                username: username.to_string(),
            }),
            _ => usage("/create <room> <passcode>"),
        },
        "joinp" => match args.as_slice() {
            [room, passcode] => Input::Event(ClientEvent::JoinPrivateRoom {
                room_id: (*room).to_string(),
                passcode: (*passcode).to_string(),
                username: Some(username.to_string()),
            }),
            _ => usage("/joinp <room> <passcode>"),
        },
        "leave" => match args.as_slice() {
            [room] => Input::Event(ClientEvent::LeavePrivateRoom {
                room_id: (*room).to_string(),
            }),
            _ => usage("/leave <room>"),
        },
        // メッセージ本文は空白を保ったまま送る
        "pm" => {
            let rest = command_line.strip_prefix("pm").unwrap_or("").trim_start();
            match rest.split_once(char::is_whitespace) {
                Some((room, message)) if !message.trim().is_empty() => {
                    Input::Event(ClientEvent::PrivateMessage {
                        room_id: room.to_string(),
                        message: message.trim_start().to_string(),
                    })
                }
                _ => usage("/pm <room> <message>"),
            }
        }
        "race" => Input::Event(ClientEvent::JoinRace {
            username: username.to_string(),
        }),
        "progress" => parse_progress(&args),
        "match" => Input::Event(ClientEvent::RandomMatchRequest),
        "who" => Input::Event(ClientEvent::RequestOnlineList),
        other => Input::Invalid(format!("Unknown command '/{}' (try /help)", other)),
    }
}

fn parse_progress(args: &[&str]) -> Input {
    if args.is_empty() || args.len() > 3 {
        return usage("/progress <pct> [wpm] [accuracy]");
    }
    let mut values = [0.0f64; 3];
    for (slot, raw) in values.iter_mut().zip(args) {
        match raw.parse::<f64>() {
            Ok(value) => *slot = value,
            Err(_) => return usage("/progress <pct> [wpm] [accuracy]"),
        }
    }
    Input::Event(ClientEvent::ProgressUpdate {
        progress: values[0],
        wpm: values[1],
        accuracy: values[2],
    })
}

fn usage(pattern: &str) -> Input {
    Input::Invalid(format!("Usage: {}", pattern))
}
