//! Account commands: register, login, logout, whoami.
//!
//! All prompting goes through dialoguer; the account store itself lives in
//! `mitra_infra::auth::LocalAuthService`.

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password, Select};

use mitra_types::auth::{MAX_USERNAME_LEN, MIN_PASSWORD_LEN, Registration, User};

use crate::state::AppState;

/// Create an account with interactive prompts and sign it in.
pub async fn register(state: &AppState, json: bool) -> Result<()> {
    let registration = prompt_registration()?;
    let user = state.auth.register(registration).await?;
    print_signed_in(&user, "Account created", json)?;
    Ok(())
}

/// Sign in, prompting for whatever was not given on the command line.
pub async fn login(state: &AppState, username: Option<String>, json: bool) -> Result<()> {
    let username = match username {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;

    let user = state.auth.login(&username, &password).await?;
    print_signed_in(&user, "Signed in", json)?;
    Ok(())
}

pub async fn logout(state: &AppState, json: bool) -> Result<()> {
    let was = state.auth.current_user();
    state.auth.logout().await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "signed_out": true, "username": was.map(|u| u.username) })
        );
    } else {
        println!("  {} Signed out", style("✓").green().bold());
    }
    Ok(())
}

pub fn whoami(state: &AppState, json: bool) -> Result<()> {
    let user = state.auth.current_user();

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    match user {
        Some(user) => {
            println!();
            println!("  {}", style(user.display_name()).cyan().bold());
            println!("  {}  {}", style("Username:").bold(), user.username);
            if let Some(email) = &user.email {
                println!("  {}     {}", style("Email:").bold(), email);
            }
            println!(
                "  {}    {}",
                style("Joined:").bold(),
                style(user.created_at.format("%Y-%m-%d")).dim()
            );
            println!();
        }
        None => {
            println!(
                "  {} Not signed in. Run {} or {}",
                style("i").blue().bold(),
                style("mitra login").yellow(),
                style("mitra register").yellow()
            );
        }
    }
    Ok(())
}

/// Make sure someone is signed in before the chat view opens.
///
/// Returns `None` when the user chose to cancel.
pub async fn ensure_signed_in(state: &AppState) -> Result<Option<User>> {
    if let Some(user) = state.auth.current_user() {
        return Ok(Some(user));
    }

    println!();
    println!(
        "  {} Sign in to chat with {}",
        style("🔒").bold(),
        style(&state.config.assistant_name).cyan()
    );
    println!();

    loop {
        let choice = Select::new()
            .items(&["Sign in", "Create account", "Cancel"])
            .default(0)
            .interact()?;

        let attempt = match choice {
            0 => {
                let username = Input::<String>::new()
                    .with_prompt("Username")
                    .interact_text()?;
                let password = Password::new().with_prompt("Password").interact()?;
                state.auth.login(&username, &password).await
            }
            1 => state.auth.register(prompt_registration()?).await,
            _ => return Ok(None),
        };

        match attempt {
            Ok(user) => return Ok(Some(user)),
            Err(err) => {
                println!("  {} {err}", style("!").red().bold());
            }
        }
    }
}

fn prompt_registration() -> Result<Registration> {
    let username = Input::<String>::new()
        .with_prompt("Username")
        .validate_with(|input: &String| -> Result<(), String> {
            let trimmed = input.trim();
            if trimmed.is_empty() {
                Err("username is required".to_string())
            } else if trimmed.chars().count() > MAX_USERNAME_LEN {
                Err(format!("at most {MAX_USERNAME_LEN} characters"))
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords don't match")
        .validate_with(|input: &String| -> Result<(), String> {
            if input.chars().count() < MIN_PASSWORD_LEN {
                Err(format!("at least {MIN_PASSWORD_LEN} characters"))
            } else {
                Ok(())
            }
        })
        .interact()?;

    let first_name = optional_field("First name")?;
    let last_name = optional_field("Last name")?;
    let email = optional_field("Email")?;

    Ok(Registration {
        username,
        password,
        email,
        first_name,
        last_name,
    })
}

fn optional_field(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(format!("{prompt} (optional)"))
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn print_signed_in(user: &User, action: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!(
            "  {} {action} as {}",
            style("✓").green().bold(),
            style(user.display_name()).cyan().bold()
        );
    }
    Ok(())
}
