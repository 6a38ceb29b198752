//! Placeholder substitution for greeting templates.
//!
//! Recognized fields are `{first}`, `{last}`, `{fullname}`, `{username}`,
//! `{mention}`, `{id}`, `{count}` and `{chatname}`. Anything else between
//! braces, empty braces and unmatched braces are copied through unchanged,
//! so rendering never fails. `{{` and `}}` write a single literal brace. Values taken from users or chats are
//! HTML-escaped before they are inserted.

use super::Member;
use crate::utils::{html_escape, mention_html};

/// Shown in place of an empty first name.
pub const NAMELESS: &str = "PersonWithNoName";

/// Placeholder names understood by [`render`].
pub const FIELDS: [&str; 8] = [
    "first", "last", "fullname", "username", "mention", "id", "count", "chatname",
];

/// Pre-escaped values for every recognized placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFields {
    first: String,
    last: String,
    fullname: String,
    username: String,
    mention: String,
    id: String,
    count: String,
    chatname: String,
}

impl TemplateFields {
    pub fn new(member: &Member, chat_name: &str, count: u32) -> Self {
        let raw_first = display_first_name(member);
        let first = html_escape(raw_first);
        let mention = mention_html(member.id.0, raw_first);

        let last = match member.last_name.as_deref() {
            Some(last) if !last.is_empty() => html_escape(last),
            _ => first.clone(),
        };
        let fullname = match member.last_name.as_deref() {
            Some(last) if !last.is_empty() => html_escape(&format!("{raw_first} {last}")),
            _ => first.clone(),
        };
        let username = match member.username.as_deref() {
            Some(username) if !username.is_empty() => format!("@{}", html_escape(username)),
            _ => mention.clone(),
        };

        Self {
            first,
            last,
            fullname,
            username,
            mention,
            id: member.id.0.to_string(),
            count: count.to_string(),
            chatname: html_escape(chat_name),
        }
    }

    /// Value for a placeholder name, `None` if the name is not recognized.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "first" => &self.first,
            "last" => &self.last,
            "fullname" => &self.fullname,
            "username" => &self.username,
            "mention" => &self.mention,
            "id" => &self.id,
            "count" => &self.count,
            "chatname" => &self.chatname,
            _ => return None,
        };
        Some(value)
    }
}

/// First name as shown to users, with the placeholder for nameless accounts.
pub fn display_first_name(member: &Member) -> &str {
    if member.first_name.trim().is_empty() {
        NAMELESS
    } else {
        &member.first_name
    }
}

/// Substitute recognized placeholders. Total: every input renders.
pub fn render(template: &str, fields: &TemplateFields) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(at) = rest.find(['{', '}']) {
        out.push_str(&rest[..at]);
        let brace = rest.as_bytes()[at];
        let after = &rest[at + 1..];

        // `{{` and `}}` stand for one literal brace
        if after.as_bytes().first() == Some(&brace) {
            out.push(char::from(brace));
            rest = &after[1..];
            continue;
        }

        if brace == b'{'
            && let Some(end) = after
                .find(['{', '}'])
                .filter(|&end| after.as_bytes()[end] == b'}')
            && let Some(value) = fields.get(&after[..end])
        {
            out.push_str(value);
            rest = &after[end + 1..];
            continue;
        }

        out.push(char::from(brace));
        rest = after;
    }

    out.push_str(rest);
    out
}

/// Fill only `{first}` with the raw first name, for plain-text fallbacks.
pub fn fill_first(template: &str, member: &Member) -> String {
    template.replace("{first}", display_first_name(member))
}
