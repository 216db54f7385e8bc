//! Parsing of CLI input lines.

use thiserror::Error;

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: send a chat message to the current room
    Say(String),
    Join(String),
    Leave(String),
    Typing { to_user_id: String, typing: bool },
    Offline,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    MissingArgument(&'static str),

    #[error("Unknown command '{0}', type /help for the list of commands")]
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  <text>               send a message to the current room
  /join <room>         join a room and make it current
  /leave <room>        leave a room
  /typing <user>       tell <user> you are typing
  /stoptyping <user>   tell <user> you stopped typing
  /offline             go offline on this connection
  /help                show this help
  /quit                exit";

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    let required = |usage: &'static str| {
        if argument.is_empty() {
            Err(CommandError::MissingArgument(usage))
        } else {
            Ok(argument.to_string())
        }
    };

    match name {
        "join" => required("/join <room>").map(Command::Join),
        "leave" => required("/leave <room>").map(Command::Leave),
        "typing" => required("/typing <user>").map(|to_user_id| Command::Typing {
            to_user_id,
            typing: true,
        }),
        "stoptyping" => required("/stoptyping <user>").map(|to_user_id| Command::Typing {
            to_user_id,
            typing: false,
        }),
        "offline" => Ok(Command::Offline),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
