//! Utility functions.
//!
//! Small HTML helpers shared by the greeting renderer and the command replies.

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build an HTML mention link for a user.
pub fn mention_html(user_id: u64, name: &str) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user_id, html_escape(name))
}
