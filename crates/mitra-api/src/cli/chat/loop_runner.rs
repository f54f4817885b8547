//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: sign-in gate, opening the
//! conversation, welcome banner and greeting, the input loop with its typing
//! spinner, slash commands, and teardown.
//!
//! While a reply is pending the prompt stays live. Text sent in that window
//! is rejected as busy; `/new` resets the log and abandons the pending reply;
//! `/exit` and `/logout` leave immediately.
//!
//! Once the prompt is up, all output goes through its `SharedWriter` so it
//! lands above the line being edited.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline_async::SharedWriter;
use tracing::{debug, info};

use mitra_core::chat::{ConversationSession, IgnoreReason, SendOutcome};
use mitra_infra::auth::LocalAuthService;
use mitra_infra::transport::create_adapter;
use mitra_types::chat::{Message, Notice};
use mitra_types::error::TransportError;
use mitra_types::transport::BotReply;

use crate::cli::auth::ensure_signed_in;
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;
use super::transcript;

type ChatSession = ConversationSession<Arc<LocalAuthService>>;

/// What the loop does after handling a line.
enum Flow {
    Continue,
    Exit,
}

/// How the wait for a pending reply ended.
enum Wait {
    Reply(Result<BotReply, TransportError>),
    Reset,
    Exit,
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat view.
pub async fn run_chat_loop(state: &AppState) -> anyhow::Result<()> {
    let Some(user) = ensure_signed_in(state).await? else {
        println!("  {}", style("Chat cancelled.").dim());
        return Ok(());
    };

    let config = &state.config;
    let adapter = create_adapter(config).context("failed to set up the chat backend")?;
    let backend_name = adapter.backend_name().to_string();
    let renderer = ChatRenderer::new(config.assistant_name.clone());

    let mut session: ChatSession = ConversationSession::new(
        Arc::clone(&state.auth),
        Arc::new(adapter),
        config.webhook_id.clone(),
    )
    .with_greeting(config.greeting.clone());

    let connecting = spinner("connecting...");
    let started = session.start().await;
    connecting.finish_and_clear();
    if let Err(err) = started {
        let notice = Notice::from(&err);
        println!("{}\n", renderer.render_notice(&notice));
        if notice.requires_sign_in() {
            state.auth.logout().await?;
            println!("  {}", style("Run `mitra login` to sign in.").dim());
            return Ok(());
        }
        return Err(err).context("could not open a conversation with the assistant");
    }

    print_welcome_banner(&config.assistant_name, &user.display_name(), &backend_name);
    for message in session.messages() {
        println!("{}\n", renderer.render_message(message));
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, mut out) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                writeln!(out, "\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim())?;
                continue;
            }
            InputEvent::Message(text) => text,
        };
        if text.is_empty() {
            continue;
        }
        chat_input.add_history(&text);

        if let Some(cmd) = commands::parse(&text) {
            match handle_command(cmd, state, &mut session, &mut chat_input, &mut out, &renderer)
                .await?
            {
                Flow::Continue => continue,
                Flow::Exit => break,
            }
        }

        let ticket = match session.begin_send(&text) {
            Ok(ticket) => ticket,
            Err(reason) => {
                print_ignored(&mut out, reason)?;
                continue;
            }
        };
        writeln!(out, "{}\n", renderer.render_message(&last_message(&session)?))?;

        let typing = spinner("typing...");
        let reply = session.dispatch(&ticket);
        tokio::pin!(reply);

        let wait = loop {
            tokio::select! {
                result = &mut reply => break Wait::Reply(result),
                event = chat_input.read_line() => match event {
                    InputEvent::Eof => break Wait::Exit,
                    InputEvent::Interrupted => {}
                    InputEvent::Message(line) => match commands::parse(&line) {
                        Some(ChatCommand::New) => {
                            session.reset();
                            break Wait::Reset;
                        }
                        Some(ChatCommand::Exit) => break Wait::Exit,
                        Some(ChatCommand::Logout) => {
                            state.auth.logout().await?;
                            typing.suspend(|| {
                                writeln!(out, "  {} Signed out", style("✓").green().bold())
                            })?;
                            break Wait::Exit;
                        }
                        Some(_) => typing.suspend(|| {
                            writeln!(
                                out,
                                "  {}",
                                style("Available once the assistant replies.").dim()
                            )
                        })?,
                        None if line.is_empty() => {}
                        None => {
                            if let Err(reason) = session.begin_send(&line) {
                                typing.suspend(|| print_ignored(&mut out, reason))?;
                            }
                        }
                    },
                },
            }
        };
        typing.finish_and_clear();

        match wait {
            Wait::Reply(result) => match session.finish_send(ticket, result) {
                SendOutcome::Replied(message) => {
                    writeln!(out, "{}\n", renderer.render_message(&message))?;
                }
                SendOutcome::Failed(notice) => {
                    writeln!(out, "{}\n", renderer.render_notice(&notice))?;
                    if notice.requires_sign_in() {
                        state.auth.logout().await?;
                        writeln!(
                            out,
                            "  {}",
                            style("Run `mitra login` to sign in again.").dim()
                        )?;
                        break;
                    }
                }
                SendOutcome::Discarded | SendOutcome::Ignored(_) => {}
            },
            Wait::Reset => {
                debug!("Pending reply abandoned by reset");
                print_reset(&mut out, &session, &renderer)?;
            }
            Wait::Exit => break,
        }
    }

    chat_input.flush();
    let messages = session.end();
    info!(messages = messages.len(), "Chat view closed");
    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}

async fn handle_command(
    cmd: ChatCommand,
    state: &AppState,
    session: &mut ChatSession,
    chat_input: &mut ChatInput,
    out: &mut SharedWriter,
    renderer: &ChatRenderer,
) -> anyhow::Result<Flow> {
    match cmd {
        ChatCommand::Help => commands::print_help(out)?,
        ChatCommand::Clear => chat_input.clear(),
        ChatCommand::Exit => return Ok(Flow::Exit),
        ChatCommand::New => {
            session.reset();
            print_reset(out, session, renderer)?;
        }
        ChatCommand::History(limit) => {
            writeln!(out)?;
            for message in session.history(limit) {
                writeln!(out, "{}", renderer.render_preview(message))?;
            }
            writeln!(out)?;
        }
        ChatCommand::Export(path) => {
            match transcript::export(
                session.messages(),
                &state.config.assistant_name,
                &state.data_dir,
                path,
            )
            .await
            {
                Ok(path) => writeln!(
                    out,
                    "\n  {} Transcript saved to {}\n",
                    style("✓").green().bold(),
                    style(path.display()).cyan()
                )?,
                Err(e) => writeln!(out, "\n  {} {e:#}\n", style("!").red().bold())?,
            }
        }
        ChatCommand::Whoami => match state.auth.current_user() {
            Some(user) => writeln!(
                out,
                "\n  Signed in as {} ({})\n",
                style(user.display_name()).cyan().bold(),
                user.username
            )?,
            None => writeln!(out, "\n  {}\n", style("Not signed in.").yellow())?,
        },
        ChatCommand::Logout => {
            state.auth.logout().await?;
            writeln!(out, "\n  {} Signed out", style("✓").green().bold())?;
            return Ok(Flow::Exit);
        }
        ChatCommand::Unknown(cmd_name) => {
            writeln!(
                out,
                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(cmd_name).dim()
            )?;
        }
    }
    Ok(Flow::Continue)
}

fn print_reset(
    out: &mut impl Write,
    session: &ChatSession,
    renderer: &ChatRenderer,
) -> std::io::Result<()> {
    writeln!(out, "\n  {}\n", style("Started a new conversation.").dim())?;
    for message in session.messages() {
        writeln!(out, "{}\n", renderer.render_message(message))?;
    }
    Ok(())
}

fn print_ignored(out: &mut impl Write, reason: IgnoreReason) -> std::io::Result<()> {
    writeln!(out, "  {} {}", style("…").yellow().bold(), style(ignored_hint(reason)).dim())
}

fn ignored_hint(reason: IgnoreReason) -> &'static str {
    match reason {
        IgnoreReason::Busy => "Still waiting for the previous reply.",
        IgnoreReason::EmptyInput => "Type a message first.",
        IgnoreReason::NotStarted => "The conversation is not open yet.",
    }
}

fn last_message(session: &ChatSession) -> anyhow::Result<Message> {
    session
        .messages()
        .last()
        .cloned()
        .context("message log is empty after a send")
}
