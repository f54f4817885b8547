//! Minimal markdown-to-HTML formatter for bot replies.
//!
//! This is a fixed, ordered pipeline of regex substitutions rather than a
//! parser. Rule order is part of the contract:
//!
//! 1. `#`/`##`/`###` headings (line-anchored)
//! 2. `**bold**`
//! 3. `*italic*`
//! 4. ```` ``` ```` fenced code blocks (contents trimmed)
//! 5. `` `inline code` ``
//! 6. `> ` blockquotes (line-anchored)
//! 7. `1. ` ordered list items (line-anchored)
//! 8. `- ` / `* ` unordered list items (line-anchored)
//! 9. every remaining newline becomes `<br />`
//!
//! followed by a pass that wraps each run of consecutive list items in a
//! single `<ol>` or `<ul>`.
//!
//! Known limitations, kept for output compatibility:
//!
//! - Markup produced by an earlier rule is not protected from later rules,
//!   so `*` or backticks inside a code block are still rewritten.
//! - Overlapping markers (`**a*b**c*`) produce whatever the regexes produce.
//! - **No HTML escaping is performed.** Raw HTML in the input passes through
//!   verbatim. Only feed this trusted backend output, never user text; use
//!   [`plain_paragraph`] for user-authored messages.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Prefixes the list items of each kind until the wrapping pass runs.
const ORDERED_MARK: char = '\u{E000}';
const UNORDERED_MARK: char = '\u{E001}';

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("markdown pattern must compile")
}

static H3: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^### (.*)$"));
static H2: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^## (.*)$"));
static H1: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^# (.*)$"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*(.*?)\*\*"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| compile(r"\*(.*?)\*"));
static FENCE: LazyLock<Regex> = LazyLock::new(|| compile(r"```[\s\S]*?```"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| compile(r"`([^`]+)`"));
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^> (.*)$"));
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^\d+\. (.*)$"));
static UNORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"(?mR)^[-*] (.*)$"));

static ORDERED_RUN: LazyLock<Regex> = LazyLock::new(|| list_run(ORDERED_MARK));
static UNORDERED_RUN: LazyLock<Regex> = LazyLock::new(|| list_run(UNORDERED_MARK));
static ITEM: LazyLock<Regex> = LazyLock::new(|| compile(r"<li>.*?</li>"));

/// One or more marked items separated only by whitespace or `<br />`.
fn list_run(mark: char) -> Regex {
    compile(&format!(
        r"{mark}<li>.*?</li>(?:(?:\s|<br />)*{mark}<li>.*?</li>)*"
    ))
}

/// Render markdown to an HTML fragment.
///
/// Pure and total: malformed markup is left as literal text.
pub fn render(text: &str) -> String {
    let html = H3.replace_all(text, "<h3>${1}</h3>");
    let html = H2.replace_all(&html, "<h2>${1}</h2>");
    let html = H1.replace_all(&html, "<h1>${1}</h1>");

    let html = BOLD.replace_all(&html, "<strong>${1}</strong>");
    let html = ITALIC.replace_all(&html, "<em>${1}</em>");

    let html = FENCE.replace_all(&html, |caps: &Captures| {
        let fenced = &caps[0];
        let code = fenced[3..fenced.len() - 3].trim();
        format!("<pre><code>{code}</code></pre>")
    });
    let html = INLINE_CODE.replace_all(&html, "<code>${1}</code>");

    let html = BLOCKQUOTE.replace_all(&html, "<blockquote>${1}</blockquote>");

    let html = ORDERED_ITEM.replace_all(&html, format!("{ORDERED_MARK}<li>${{1}}</li>").as_str());
    let html = UNORDERED_ITEM.replace_all(&html, format!("{UNORDERED_MARK}<li>${{1}}</li>").as_str());

    let html = html.replace('\n', "<br />");

    wrap_lists(&html)
}

/// Wrap each maximal run of same-kind list items in one container.
///
/// Breaks and whitespace between items of a run are dropped.
fn wrap_lists(html: &str) -> String {
    let html = ORDERED_RUN.replace_all(html, |caps: &Captures| wrap_run(&caps[0], "ol"));
    UNORDERED_RUN
        .replace_all(&html, |caps: &Captures| wrap_run(&caps[0], "ul"))
        .into_owned()
}

fn wrap_run(run: &str, tag: &str) -> String {
    let items: String = ITEM.find_iter(run).map(|m| m.as_str()).collect();
    format!("<{tag}>{items}</{tag}>")
}

/// Render user-authored text as a single escaped paragraph.
pub fn plain_paragraph(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
