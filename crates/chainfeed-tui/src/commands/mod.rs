//! `:` commands.
//!
//! [`Command::parse`] turns the command-bar text into a [`Command`];
//! [`execute_command`] applies it to the [`AppState`]. [`COMMAND_HELP`] feeds
//! the help popup so the two never drift apart.

use thiserror::Error;

use crate::{app::AppState, event::AppEvent, theme::Theme};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Drop every entry and every seen key.
    Clear,
    Help,
    Theme(String),
    /// Toggle the timestamp column.
    Timestamps,
    /// Jump back to the newest entry.
    Newest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// `(spelling, description)` for every command, in help-popup order.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    (":clear", "Clear the feed (no undo)"),
    (":newest", "Jump to the newest event"),
    (":ts", "Toggle timestamps"),
    (":theme <name>", "Switch theme (default, gruvbox)"),
    (":help", "Toggle this popup"),
    (":q", "Quit"),
];

impl Command {
    /// Parse the text typed after `:`. Blank input parses to `Ok(None)`.
    pub fn parse(input: &str) -> Result<Option<Command>, CommandError> {
        let mut words = input.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.collect::<Vec<_>>().join(" ");

        let cmd = match name {
            "q" | "q!" | "quit" | "quit!" => Command::Quit,
            "clear" | "cl" => Command::Clear,
            "help" | "h" => Command::Help,
            "ts" | "timestamps" => Command::Timestamps,
            "newest" | "top" => Command::Newest,
            "theme" if arg.is_empty() => {
                return Err(CommandError::Usage("theme <default|gruvbox>"))
            }
            "theme" => Command::Theme(arg),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(cmd))
    }
}

pub fn execute_command(s: &mut AppState, cmd: Command) {
    tracing::debug!(command = ?cmd, "executing command");
    match cmd {
        Command::Quit => s.quit = true,
        Command::Clear => s.request_clear(),
        Command::Help => s.show_help = !s.show_help,
        Command::Theme(name) => s.theme = Theme::by_name(&name),
        Command::Timestamps => s.feed.show_timestamps = !s.feed.show_timestamps,
        Command::Newest => s.feed.handle(&AppEvent::ScrollToNewest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases() {
        for input in ["q", " quit ", "q!"] {
            assert_eq!(Command::parse(input), Ok(Some(Command::Quit)), "{input:?}");
        }
        assert_eq!(Command::parse("cl"), Ok(Some(Command::Clear)));
        assert_eq!(Command::parse("top"), Ok(Some(Command::Newest)));
    }

    #[test]
    fn theme_takes_the_rest_of_the_line() {
        assert_eq!(
            Command::parse("theme  gruvbox "),
            Ok(Some(Command::Theme("gruvbox".into())))
        );
        assert!(matches!(Command::parse("theme"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn blank_input_is_not_a_command() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn unknown_command_names_itself() {
        let err = Command::parse("frobnicate now").unwrap_err();
        assert_eq!(err.to_string(), "unknown command: frobnicate");
    }
}
