//! CLI command definitions for the `mitra` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod auth;
pub mod chat;
pub mod render;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with KIIT MITRA from your terminal.
#[derive(Parser)]
#[command(name = "mitra", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat with the assistant.
    Chat,

    /// Create a local account.
    #[command(alias = "signup")]
    Register,

    /// Sign in to an existing account.
    #[command(alias = "signin")]
    Login {
        /// Username (prompted when omitted).
        username: Option<String>,
    },

    /// Sign out of the current account.
    #[command(alias = "signout")]
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Show configuration and account status.
    Status,

    /// Render markdown to HTML the way chat replies are rendered.
    Render {
        /// Markdown file to read (stdin when omitted).
        file: Option<PathBuf>,

        /// Treat the input as plain user text: escape it and wrap in a paragraph.
        #[arg(long)]
        plain: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
