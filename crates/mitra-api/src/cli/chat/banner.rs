//! Welcome banner display for chat sessions.

use console::style;

/// Print the welcome banner once the conversation is open.
///
/// Shows the assistant name, who is signed in, and the backend in use.
pub fn print_welcome_banner(assistant_name: &str, user_name: &str, backend: &str) {
    println!();
    println!("  {} {}", "🎓", style(assistant_name).cyan().bold());
    println!("  {}", style("Your KIIT campus companion").dim());
    println!();
    println!("  {}     {}", style("User:").bold(), style(user_name).dim());
    println!("  {}  {}", style("Backend:").bold(), style(backend).dim());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
