use std::collections::HashSet;
use std::sync::Arc;
use ammonia::Builder;
use tera::{Context, Tera};
use crate::error::AppError;

pub const GUEST_CONFIRMATION_TEMPLATE: &str = "booking_confirmation.html";
pub const HOST_NOTIFICATION_TEMPLATE: &str = "booking_notification_host.html";

/// Compiles the bundled notification templates.
pub fn load_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (GUEST_CONFIRMATION_TEMPLATE, include_str!("../../../templates/booking_confirmation.html")),
        (HOST_NOTIFICATION_TEMPLATE, include_str!("../../../templates/booking_notification_host.html")),
    ])?;
    Ok(tera)
}

#[derive(Clone)]
pub struct NotificationRenderer {
    tera: Arc<Tera>,
}

impl NotificationRenderer {
    pub fn new(tera: Arc<Tera>) -> Self {
        Self { tera }
    }

    pub fn render(&self, template_id: &str, context: &Context) -> Result<String, AppError> {
        Ok(self.tera.render(template_id, context)?)
    }
}

/// Elements that start a new line in the plain-text part.
const BLOCK_TAGS: [&str; 15] = [
    "br", "p", "div", "tr", "li", "ul", "ol", "table", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
];
/// Table cells, separated by a space.
const CELL_TAGS: [&str; 2] = ["td", "th"];

/// Plain-text rendition of an HTML body: markup and comments removed,
/// entities decoded, whitespace collapsed. `<style>`, `<script>` and
/// `<title>` contents are dropped.
pub fn strip_tags(html: &str) -> String {
    // Only bare layout tags survive cleaning, and text is re-escaped, so
    // every '<' left in the output opens one of those tags.
    let cleaned = Builder::empty()
        .tags(BLOCK_TAGS.iter().chain(CELL_TAGS.iter()).copied().collect())
        .clean_content_tags(HashSet::from(["script", "style", "title"]))
        .strip_comments(true)
        .clean(html)
        .to_string();

    let mut text = String::with_capacity(cleaned.len());
    let mut rest = cleaned.as_str();
    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else { break };
        let name = rest[start + 1..start + end].trim_start_matches('/');
        if BLOCK_TAGS.contains(&name) {
            text.push('\n');
        } else if CELL_TAGS.contains(&name) {
            text.push(' ');
        }
        rest = &rest[start + end + 1..];
    }
    text.push_str(rest);

    collapse_whitespace(&unescape_text(&text))
}

/// Reverses the escaping ammonia applies to text nodes.
fn unescape_text(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
