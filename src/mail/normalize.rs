use html2text::config;
use html2text::render::TrivialDecorator;

use crate::domain::email::{BodyContentType, Message, NormalizedMessage};

// wide enough that html2text never wraps inside a paragraph
const RENDER_WIDTH: usize = 10_000;

/// Plain text of a message body.
///
/// HTML is reduced to its visible text with whitespace collapsed; plain text
/// passes through unchanged. A missing body falls back to the preview.
pub fn normalize(message: &Message) -> String {
    match &message.body {
        Some(body) if body.content_type == BodyContentType::Html => html_to_text(&body.content),
        Some(body) => body.content.clone(),
        None => message.preview.clone(),
    }
}

pub fn normalize_message(message: Message) -> NormalizedMessage {
    let text = normalize(&message);
    NormalizedMessage::new(message, text)
}

/// Best effort: malformed markup yields whatever text could be recovered,
/// an empty string in the worst case.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let rendered = std::panic::catch_unwind(|| {
        // raw mode: table cells as plain blocks, no borders; trivial decorator: no link brackets
        config::with_decorator(TrivialDecorator::new())
            .raw_mode(true)
            .link_footnotes(false)
            .string_from_read(html.as_bytes(), RENDER_WIDTH)
            .unwrap_or_default()
    })
    .unwrap_or_default();
    collapse_whitespace(&rendered)
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
