//! `mitra render`: run text through the chat markdown renderer.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use mitra_core::markdown;

/// Render `file` (or stdin) and print the HTML fragment.
pub async fn render(file: Option<&Path>, plain: bool, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let html = to_html(&text, plain);
    if json {
        println!("{}", serde_json::json!({ "html": html }));
    } else {
        println!("{html}");
    }
    Ok(())
}

fn to_html(text: &str, plain: bool) -> String {
    if plain {
        markdown::plain_paragraph(text)
    } else {
        markdown::render(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_mode_renders() {
        assert_eq!(to_html("# Title", false), "<h1>Title</h1>");
    }

    #[test]
    fn plain_mode_escapes() {
        assert_eq!(to_html("**<b>**", true), "<p>**&lt;b&gt;**</p>");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = render(Some(&dir.path().join("nope.md")), false, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }
}
