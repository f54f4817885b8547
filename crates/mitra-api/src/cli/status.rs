//! Status dashboard: configuration, account, and data locations.

use anyhow::Result;
use console::style;

use mitra_infra::config::reply_timeout;
use mitra_infra::filesystem::{config_path, transcripts_dir};
use mitra_types::config::BackendKind;

use crate::state::AppState;

pub fn status(state: &AppState, json: bool) -> Result<()> {
    let config = &state.config;
    let user = state.auth.current_user();
    let timeout = reply_timeout(config);
    let config_file = config_path(&state.data_dir);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file.exists(),
            "backend": config.backend.to_string(),
            "webhook_id": config.webhook_id,
            "chat_api_base_url": config.chat_api_base_url,
            "reply_timeout_secs": timeout.as_secs(),
            "signed_in_as": user.as_ref().map(|u| u.username.clone()),
            "registered_users": state.auth.user_count(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} v{}",
        style("💬").bold(),
        style(&config.assistant_name).cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Account ──").dim());
    match &user {
        Some(user) => println!("  Signed in: {}", style(user.display_name()).green()),
        None => println!("  Signed in: {}", style("no").yellow()),
    }
    println!("  Accounts:  {}", state.auth.user_count());
    println!();

    println!("  {}", style("── Backend ──").dim());
    println!("  Kind:      {}", style(config.backend).bold());
    if config.backend == BackendKind::Hosted {
        println!("  Endpoint:  {}", style(&config.chat_api_base_url).dim());
        println!("  Webhook:   {}", style(&config.webhook_id).dim());
    } else {
        println!("  Delay:     {} ms", config.mock_reply_delay_ms);
    }
    println!("  Timeout:   {}s", timeout.as_secs());
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir:    {}", style(state.data_dir.display()).dim());
    println!(
        "  Config:      {}{}",
        style(config_file.display()).dim(),
        if config_file.exists() { "" } else { " (defaults)" }
    );
    println!(
        "  Transcripts: {}",
        style(transcripts_dir(&state.data_dir).display()).dim()
    );
    println!();

    Ok(())
}
