//! Button directives embedded in greeting templates.
//!
//! A directive looks like `[Rules](buttonurl://t.me/chat)`. The slashes after
//! the scheme are optional and a trailing `:same` puts the button on the same
//! row as the one before it. A directive preceded by an odd number of
//! backslashes is kept as text, minus one backslash.

use crate::database::ButtonSpec;
use crate::platform::{InlineButton, Keyboard};

pub const BUTTON_SCHEME: &str = "buttonurl:";
pub const SAME_ROW_MARKER: &str = ":same";

/// Template text with its directives removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub text: String,
    pub buttons: Vec<ButtonSpec>,
}

/// Split a raw template into its text and its buttons, in directive order.
pub fn parse(raw: &str) -> ParsedTemplate {
    let mut text = String::with_capacity(raw.len());
    let mut buttons = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        let (before, candidate) = rest.split_at(open);

        let Some((button, consumed)) = parse_directive(candidate) else {
            text.push_str(before);
            text.push('[');
            rest = &candidate[1..];
            continue;
        };

        let backslashes = before.len() - before.trim_end_matches('\\').len();
        if backslashes % 2 == 1 {
            text.push_str(&before[..before.len() - 1]);
            text.push_str(&candidate[..consumed]);
        } else {
            text.push_str(before);
            buttons.push(button);
        }
        rest = &candidate[consumed..];
    }
    text.push_str(rest);

    ParsedTemplate {
        text: text.trim().to_string(),
        buttons,
    }
}

/// Parse one directive at the start of `s`. Returns the button and the
/// number of bytes it spans.
fn parse_directive(s: &str) -> Option<(ButtonSpec, usize)> {
    let body = s.strip_prefix('[')?;
    let close = body.find(']')?;
    let label = &body[..close];
    if label.is_empty() || label.contains(['[', '\n']) {
        return None;
    }

    let target = body[close + 1..].strip_prefix('(')?.strip_prefix(BUTTON_SCHEME)?;
    let skipped = target.len() - target.trim_start_matches('/').len();
    let target = &target[skipped.min(2)..];

    let end = target.find(')')?;
    let url = &target[..end];
    if url.contains('\n') {
        return None;
    }

    let (url, same_row) = match url.strip_suffix(SAME_ROW_MARKER) {
        Some(url) => (url, true),
        None => (url, false),
    };
    if url.is_empty() {
        return None;
    }

    // '[' + label + "](" + scheme + slashes + url (with marker) + ')'
    let consumed = s.len() - target.len() + end + 1;

    Some((
        ButtonSpec {
            label: label.to_string(),
            url: url.to_string(),
            same_row,
        },
        consumed,
    ))
}

/// Arrange buttons into keyboard rows. A same-row button joins the last row
/// if there is one.
pub fn layout(buttons: &[ButtonSpec]) -> Keyboard {
    let mut rows: Keyboard = Vec::new();
    for stored in buttons {
        let button = InlineButton::url(stored.label.clone(), stored.url.clone());
        match rows.last_mut() {
            Some(row) if stored.same_row => row.push(button),
            _ => rows.push(vec![button]),
        }
    }
    rows
}

/// Render buttons back into directive lines.
pub fn revert(buttons: &[ButtonSpec]) -> String {
    buttons
        .iter()
        .map(|b| {
            let marker = if b.same_row { SAME_ROW_MARKER } else { "" };
            format!("[{}](buttonurl://{}{})", b.label, b.url, marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Template text followed by its reverted directives, as an admin would type it.
pub fn with_directives(text: &str, buttons: &[ButtonSpec]) -> String {
    if buttons.is_empty() {
        return text.to_string();
    }
    format!("{}\n{}", text, revert(buttons))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ButtonAction;

    #[test]
    fn test_parse_strips_directives_in_order() {
        let parsed = parse(
            "Welcome!\n[A](buttonurl://a.com)\n[B](buttonurl://b.com:same)\n[C](buttonurl:c.com)",
        );
        assert_eq!(parsed.text, "Welcome!");
        assert_eq!(
            parsed.buttons,
            vec![
                ButtonSpec::new("A", "a.com"),
                ButtonSpec::new("B", "b.com").same_row(),
                ButtonSpec::new("C", "c.com"),
            ]
        );
    }

    #[test]
    fn test_layout_same_row() {
        let rows = layout(&parse("[A](buttonurl://a)[B](buttonurl://b:same)[C](buttonurl://c)").buttons);
        let labels: Vec<Vec<&str>> = rows
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect();
        assert_eq!(labels, vec![vec!["A", "B"], vec!["C"]]);
        assert_eq!(rows[0][0].action, ButtonAction::Url("a".into()));
    }

    #[test]
    fn test_leading_same_row_starts_a_row() {
        let rows = layout(&[ButtonSpec::new("A", "a").same_row()]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_ordinary_links_are_text() {
        let parsed = parse("See [docs](https://example.com) and [x]");
        assert_eq!(parsed.text, "See [docs](https://example.com) and [x]");
        assert!(parsed.buttons.is_empty());
    }

    #[test]
    fn test_escaped_directive_stays_text() {
        let parsed = parse(r"Try \[a](buttonurl://x) now");
        assert_eq!(parsed.text, "Try [a](buttonurl://x) now");
        assert!(parsed.buttons.is_empty());

        let parsed = parse(r"Two \\[a](buttonurl://x)");
        assert_eq!(parsed.text, r"Two \\");
        assert_eq!(parsed.buttons, vec![ButtonSpec::new("a", "x")]);
    }

    #[test]
    fn test_slashes_beyond_two_are_part_of_url() {
        let parsed = parse("[a](buttonurl:///x)");
        assert_eq!(parsed.buttons[0].url, "/x");
    }

    #[test]
    fn test_empty_label_or_url_is_not_a_button() {
        assert!(parse("[](buttonurl://x)").buttons.is_empty());
        assert!(parse("[a](buttonurl://)").buttons.is_empty());
        assert!(parse("[a](buttonurl://:same)").buttons.is_empty());
    }

    #[test]
    fn test_revert_keeps_order_and_markers() {
        let raw = "[A](buttonurl://a.com)\n[B](buttonurl://b.com:same)\n[C](buttonurl://c.com)";
        let parsed = parse(raw);
        assert_eq!(revert(&parsed.buttons), raw);
        assert_eq!(parse(&revert(&parsed.buttons)).buttons, parsed.buttons);
    }

    #[test]
    fn test_with_directives() {
        let buttons = vec![ButtonSpec::new("Rules", "t.me/x")];
        assert_eq!(with_directives("Hi", &buttons), "Hi\n[Rules](buttonurl://t.me/x)");
        assert_eq!(with_directives("Hi", &[]), "Hi");
    }
}
