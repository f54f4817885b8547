//! Terminal rendering of chat messages.
//!
//! Bot replies are markdown and go through `termimad`; user messages are
//! printed verbatim. Each message gets a "Label · HH:MM" header in local
//! time.

use chrono::{DateTime, Local, Utc};
use console::style;
use termimad::MadSkin;
use termimad::crossterm::style::Color;

use mitra_types::chat::{Message, Notice, NoticeKind, Sender};

/// Longest preview line printed by `/history`.
const PREVIEW_CHARS: usize = 100;

pub struct ChatRenderer {
    skin: MadSkin,
    assistant_name: String,
}

impl ChatRenderer {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(Color::Cyan);
        skin.headers[0].set_fg(Color::Cyan);
        skin.headers[1].set_fg(Color::Cyan);
        skin.inline_code.set_fg(Color::Yellow);

        Self {
            skin,
            assistant_name: assistant_name.into(),
        }
    }

    /// Header label for a message's sender.
    pub fn label(&self, sender: Sender) -> &str {
        match sender {
            Sender::User => "You",
            Sender::Bot => &self.assistant_name,
        }
    }

    /// Full message: header line, then the body indented under it.
    pub fn render_message(&self, message: &Message) -> String {
        let label = self.label(message.sender);
        let header = match message.sender {
            Sender::User => style(label).green().bold(),
            Sender::Bot => style(label).cyan().bold(),
        };
        let body = match message.sender {
            Sender::Bot => self.skin.term_text(&message.content).to_string(),
            Sender::User => message.content.clone(),
        };

        format!(
            "  {} {}\n{}",
            header,
            style(format!("· {}", format_time(message.timestamp))).dim(),
            indent(body.trim_end())
        )
    }

    /// One line per message for `/history`.
    pub fn render_preview(&self, message: &Message) -> String {
        let label = self.label(message.sender);
        let first_line = message.content.lines().next().unwrap_or_default();
        format!(
            "  {} {} {}",
            style(format_time(message.timestamp)).dim(),
            style(label).bold(),
            preview(first_line, PREVIEW_CHARS)
        )
    }

    pub fn render_notice(&self, notice: &Notice) -> String {
        let marker = match notice.kind {
            NoticeKind::NoReply => style("…").yellow().bold(),
            _ => style("!").red().bold(),
        };
        format!(
            "  {} {} {}",
            marker,
            style(&notice.title).bold(),
            style(&notice.description).dim()
        )
    }
}

/// `HH:MM` in the local time zone.
pub fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(line: &str, max_chars: usize) -> String {
    if line.chars().count() > max_chars {
        let cut: String = line.chars().take(max_chars - 3).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
