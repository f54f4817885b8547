//! Interactive terminal chat with the assistant.
//!
//! This module implements the chat view: the welcome banner, the typing
//! spinner, markdown rendering of replies, slash commands, and transcript
//! export. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
pub mod transcript;
