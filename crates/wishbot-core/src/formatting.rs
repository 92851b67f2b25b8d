//! Formatting helpers for Telegram HTML parse mode.

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `@username`, or a placeholder for accounts without one.
pub fn at_username(username: Option<&str>) -> String {
    match username {
        Some(u) if !u.is_empty() => format!("@{u}"),
        _ => "(no username)".to_string(),
    }
}

/// Body of a wish as shown to people: URL line, then the description (if any).
pub fn wish_body(url: &str, description: &str) -> String {
    if description.is_empty() {
        escape_html(url)
    } else {
        format!("{}\n{}", escape_html(url), escape_html(description))
    }
}
