//! Transcript export: renders the ordered memory log as a standalone HTML
//! document, one block per message with author/id/timestamp headers.
//!
//! Content is treated as lightweight markdown. A message that is a single
//! ```html code block is passed through verbatim so agents can emit
//! ready-made fragments.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Message;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Conversation Export</title>
  <style>
    body { font-family: 'Arial', sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; line-height: 1.6; }
    h1 { text-align: center; margin-bottom: 30px; color: #333; }
    .message { margin-bottom: 20px; border-bottom: 1px solid #eee; padding-bottom: 20px; }
    .author { font-weight: bold; font-size: 1.2em; color: #2c3e50; margin-bottom: 5px; }
    .metadata { font-size: 0.8em; color: #7f8c8d; margin-bottom: 10px; }
    .content { background-color: #f9f9f9; border-left: 4px solid #3498db; padding: 10px 15px; margin-top: 10px; }
    h2, h3, h4 { margin-top: 1em; margin-bottom: 0.5em; color: #2c3e50; }
    p { margin-bottom: 1em; }
    code { background-color: #f0f0f0; padding: 2px 4px; border-radius: 3px; font-family: monospace; }
    pre { background-color: #f0f0f0; padding: 10px; border-radius: 5px; overflow-x: auto; }
    blockquote { border-left: 3px solid #ccc; margin-left: 0; padding-left: 10px; color: #555; }
  </style>
</head>
<body>
  <h1>Conversation Export</h1>
"#;

static HTML_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```html\s*(.*?)\s*```").unwrap());
static HEADING_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").unwrap());
static HEADING_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").unwrap());
static HEADING_1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*- (.*)$").unwrap());
static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[^\n`]*\n(.*?)```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> (.*)$").unwrap());

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Convert message content to HTML.
///
/// Content that starts with a ```html block is returned as-is; everything
/// else goes through markdown-lite conversion. Content is trusted and left
/// unescaped (only the metadata headers are escaped) so agents can emit
/// markup inline.
fn convert_to_html(content: &str) -> String {
    if content.trim_start().starts_with("```html") {
        if let Some(caps) = HTML_BLOCK.captures(content) {
            return caps[1].to_string();
        }
    }

    let mut html = content.to_string();
    html = HEADING_3.replace_all(&html, "<h3>$1</h3>").into_owned();
    html = HEADING_2.replace_all(&html, "<h2>$1</h2>").into_owned();
    html = HEADING_1.replace_all(&html, "<h1>$1</h1>").into_owned();
    html = LIST_ITEM.replace_all(&html, "<li>$1</li>").into_owned();
    html = CODE_BLOCK
        .replace_all(&html, "<pre><code>$1</code></pre>")
        .into_owned();
    html = INLINE_CODE.replace_all(&html, "<code>$1</code>").into_owned();
    html = BOLD.replace_all(&html, "<strong>$1</strong>").into_owned();
    html = ITALIC.replace_all(&html, "<em>$1</em>").into_owned();
    html = BLOCKQUOTE
        .replace_all(&html, "<blockquote>$1</blockquote>")
        .into_owned();

    if !html.contains("<div") && !html.contains("<p>") {
        html = html.replace('\n', "<br>");
    }

    html
}

/// Render the full transcript page for an ordered message log.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut html = String::from(PAGE_HEAD);

    for message in messages {
        let timestamp = message
            .timestamp
            .map(|t| t.to_string())
            .unwrap_or_default();
        html.push_str(&format!(
            r#"  <div class="message">
    <div class="author">{}</div>
    <div class="metadata">
      ID: {}<br>
      Timestamp: {}
    </div>
    <div class="content">
      {}
    </div>
  </div>
"#,
            escape_html(&message.author),
            escape_html(&message.id),
            escape_html(&timestamp),
            convert_to_html(&message.content),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"AT&T" isn't</b>"#),
            "&lt;b&gt;&quot;AT&amp;T&quot; isn&#039;t&lt;/b&gt;"
        );
    }

    #[test]
    fn test_markdown_headings_and_lists() {
        let html = convert_to_html("## Plan\n- step one\n- step two");
        assert!(html.contains("<h2>Plan</h2>"));
        assert!(html.contains("<li>step one</li>"));
        assert!(html.contains("<li>step two</li>"));
    }

    #[test]
    fn test_html_block_passes_through_unescaped() {
        let html = convert_to_html("```html\n<div class=\"card\">hi</div>\n```");
        assert_eq!(html, "<div class=\"card\">hi</div>");
    }

    #[test]
    fn test_blockquote_and_inline_code() {
        let html = convert_to_html("> be brief\nuse `cargo run`");
        assert!(html.contains("<blockquote>be brief</blockquote>"));
        assert!(html.contains("<code>cargo run</code>"));
    }

    #[test]
    fn test_transcript_contains_every_message() {
        let messages = vec![
            Message::new("USER_INPUT_0", "user", "hello"),
            Message::new("reply", "echo", "hello back"),
        ];
        let page = render_transcript(&messages);
        assert!(page.contains("USER_INPUT_0"));
        assert!(page.contains("hello back"));
        assert!(page.ends_with("</html>\n"));
    }
}
