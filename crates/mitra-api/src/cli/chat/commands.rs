//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for the
//! conversation, the account, and transcript export.

use std::io::{self, Write};
use std::path::PathBuf;

use console::style;

/// Messages shown by `/history` when no count is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Reset the conversation to a single greeting.
    New,
    /// Show the last `n` messages of the log.
    History(usize),
    /// Write the log as an HTML transcript.
    Export(Option<PathBuf>),
    /// Show who is signed in.
    Whoami,
    /// Sign out and leave the chat.
    Logout,
    /// Unknown command or bad argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts
        .get(1)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" | "/reset" => Some(ChatCommand::New),
        "/history" => match arg {
            None => Some(ChatCommand::History(DEFAULT_HISTORY_LIMIT)),
            Some(n) => match n.parse::<usize>() {
                Ok(limit) if limit > 0 => Some(ChatCommand::History(limit)),
                _ => Some(ChatCommand::Unknown(
                    "/history takes a positive number".to_string(),
                )),
            },
        },
        "/export" => Some(ChatCommand::Export(arg.map(PathBuf::from))),
        "/whoami" | "/me" => Some(ChatCommand::Whoami),
        "/logout" | "/signout" => Some(ChatCommand::Logout),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Write the help text listing all available commands.
pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Available commands:").bold())?;
    writeln!(out)?;
    writeln!(out, "  {}          {}", style("/help").cyan(), "Show this help message")?;
    writeln!(out, "  {}         {}", style("/clear").cyan(), "Clear the screen")?;
    writeln!(out, "  {}           {}", style("/new").cyan(), "Start a new conversation")?;
    writeln!(out, "  {}   {}", style("/history [n]").cyan(), "Show the last n messages")?;
    writeln!(out, "  {}  {}", style("/export [path]").cyan(), "Save the conversation as HTML")?;
    writeln!(out, "  {}        {}", style("/whoami").cyan(), "Show the signed-in user")?;
    writeln!(out, "  {}        {}", style("/logout").cyan(), "Sign out and leave")?;
    writeln!(out, "  {}          {}", style("/exit").cyan(), "End the chat session")?;
    writeln!(out)?;
    writeln!(
        out,
        "  {}",
        style("Ctrl+D to exit. While the assistant is typing, /new and /exit still work.").dim()
    )?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/Q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_new() {
        assert_eq!(parse("/new"), Some(ChatCommand::New));
        assert_eq!(parse("  /reset  "), Some(ChatCommand::New));
    }

    #[test]
    fn test_parse_history() {
        assert_eq!(
            parse("/history"),
            Some(ChatCommand::History(DEFAULT_HISTORY_LIMIT))
        );
        assert_eq!(parse("/history 5"), Some(ChatCommand::History(5)));
        assert!(matches!(parse("/history 0"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(parse("/history lots"), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(parse("/export"), Some(ChatCommand::Export(None)));
        assert_eq!(
            parse("/export chat.html"),
            Some(ChatCommand::Export(Some(PathBuf::from("chat.html"))))
        );
    }

    #[test]
    fn test_parse_account_commands() {
        assert_eq!(parse("/whoami"), Some(ChatCommand::Whoami));
        assert_eq!(parse("/logout"), Some(ChatCommand::Logout));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
        assert_eq!(parse("what is 1/2?"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }

    #[test]
    fn help_is_written_to_the_given_writer() {
        console::set_colors_enabled(false);
        let mut out = Vec::new();
        print_help(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Available commands:"));
        assert!(text.contains("/export [path]"));
        assert!(text.ends_with("\n\n"));
    }
}
