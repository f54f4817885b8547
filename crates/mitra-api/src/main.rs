//! KIIT MITRA terminal chat client entry point.
//!
//! Binary name: `mitra`
//!
//! Parses CLI arguments, sets up logging, loads configuration and the local
//! account store, then dispatches to the command handler.

mod cli;
mod logging;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.quiet, cli.log_json);

    // Shell completions and rendering don't need app state
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "mitra", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Render { file, plain } => {
            return cli::render::render(file.as_deref(), *plain, cli.json).await;
        }
        _ => {}
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Chat => {
            cli::chat::loop_runner::run_chat_loop(&state).await?;
        }
        Commands::Register => {
            cli::auth::register(&state, cli.json).await?;
        }
        Commands::Login { username } => {
            cli::auth::login(&state, username, cli.json).await?;
        }
        Commands::Logout => {
            cli::auth::logout(&state, cli.json).await?;
        }
        Commands::Whoami => {
            cli::auth::whoami(&state, cli.json)?;
        }
        Commands::Status => {
            cli::status::status(&state, cli.json)?;
        }
        Commands::Completions { .. } | Commands::Render { .. } => unreachable!("handled above"),
    }

    Ok(())
}
