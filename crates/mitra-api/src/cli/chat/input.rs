//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so the prompt stays live while a reply
//! is pending, with EOF (Ctrl+D) and interrupt (Ctrl+C) surfaced as events.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a line (trimmed).
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create a new chat input handler with the given initial prompt.
    ///
    /// Returns the input handler and a `SharedWriter` that prints above the
    /// prompt without clobbering what the user is typing.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    /// Read a line of input.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(event) => to_input_event(event),
            Err(err) => {
                tracing::debug!(error = %err, "Readline failed, treating as EOF");
                InputEvent::Eof
            }
        }
    }

    /// Record a submitted line so the up arrow recalls it.
    pub fn add_history(&mut self, line: &str) {
        self.rl.add_history_entry(line.to_string());
    }

    /// Clear the terminal screen.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }

    /// Restore the terminal. Call before printing after the loop ends.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}

fn to_input_event(event: ReadlineEvent) -> InputEvent {
    match event {
        ReadlineEvent::Line(line) => InputEvent::Message(line.trim().to_string()),
        ReadlineEvent::Eof => InputEvent::Eof,
        ReadlineEvent::Interrupted => InputEvent::Interrupted,
    }
}
