//! HTML transcript export of a conversation log.
//!
//! Bot messages go through the markdown renderer, user messages are escaped
//! into a single paragraph, matching how the chat view shows them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use mitra_core::markdown::{escape_html, plain_paragraph, render};
use mitra_infra::filesystem::{transcripts_dir, write_atomic};
use mitra_types::chat::{Message, Sender};

/// Build a standalone HTML page for `messages`.
pub fn to_html(messages: &[Message], assistant_name: &str, exported_at: DateTime<Utc>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} conversation</title>\n",
        escape_html(assistant_name)
    ));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!(
        "<header><h1>{}</h1><p class=\"meta\">Exported {} &middot; {} messages</p></header>\n",
        escape_html(assistant_name),
        exported_at.format("%Y-%m-%d %H:%M UTC"),
        messages.len()
    ));

    for message in messages {
        let (class, label, body) = match message.sender {
            Sender::Bot => ("bot", assistant_name, render(&message.content)),
            Sender::User => ("user", "You", plain_paragraph(&message.content)),
        };
        html.push_str(&format!(
            "<article class=\"message {class}\" id=\"{}\">\n<div class=\"label\">{} <time datetime=\"{}\">{}</time></div>\n<div class=\"body\">{body}</div>\n</article>\n",
            escape_html(&message.id),
            escape_html(label),
            message.timestamp.to_rfc3339(),
            message.timestamp.format("%H:%M"),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Default export location: `{data_dir}/transcripts/{timestamp}.html`.
pub fn default_path(data_dir: &Path, exported_at: DateTime<Utc>) -> PathBuf {
    transcripts_dir(data_dir).join(format!("{}.html", exported_at.format("%Y%m%d-%H%M%S")))
}

/// Write the transcript and return where it landed.
pub async fn export(
    messages: &[Message],
    assistant_name: &str,
    data_dir: &Path,
    path: Option<PathBuf>,
) -> Result<PathBuf> {
    let now = Utc::now();
    let path = path.unwrap_or_else(|| default_path(data_dir, now));

    let html = to_html(messages, assistant_name, now);
    write_atomic(&path, &html)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), messages = messages.len(), "Transcript exported");
    Ok(path)
}

const STYLE: &str = "<style>
body { font-family: system-ui, sans-serif; max-width: 46rem; margin: 2rem auto; color: #1f2937; }
header { border-bottom: 1px solid #e5e7eb; margin-bottom: 1rem; }
.meta, .label time { color: #6b7280; font-size: 0.85rem; }
.message { margin: 1rem 0; padding: 0.75rem 1rem; border-radius: 0.75rem; }
.message.user { background: #e0f2fe; margin-left: 4rem; }
.message.bot { background: #f3f4f6; margin-right: 4rem; }
.label { font-weight: 600; margin-bottom: 0.25rem; }
pre { background: #111827; color: #f9fafb; padding: 0.75rem; border-radius: 0.5rem; overflow-x: auto; }
</style>
";
