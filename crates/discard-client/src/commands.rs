//! Input line parsing.
//!
//! A line starting with `/` is a command; anything else is a message for the
//! active channel.

use discard_protocol::ChannelId;
use thiserror::Error;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Post to the active channel.
    Say(String),
    /// Subscribe to a channel and make it active.
    Join(ChannelId),
    /// Unsubscribe from a channel.
    Leave(ChannelId),
    /// Print who is online.
    Online,
    /// Print unread counters.
    Unread,
    /// Exit.
    Quit,
}

/// Input that is not a valid command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: /{0}")]
    Unknown(String),

    #[error("Usage: /{0} <channel>")]
    MissingChannel(&'static str),
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown commands or missing arguments.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Command::Say(line.to_string())));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next();

        let command = match name {
            "join" | "j" => Command::Join(
                argument
                    .ok_or(CommandError::MissingChannel("join"))?
                    .to_string(),
            ),
            "leave" | "part" => Command::Leave(
                argument
                    .ok_or(CommandError::MissingChannel("leave"))?
                    .to_string(),
            ),
            "online" | "who" => Command::Online,
            "unread" => Command::Unread,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}
