//! Leading-heading extraction for markdown bodies and rendered HTML.
//!
//! A document whose first non-blank line is a level-1 ATX heading
//! (`# Title`) carries its title twice once a page layout prints the
//! title itself. [`extract_leading_heading`] lifts that heading out of the
//! raw markdown as plain text, and [`strip_rendered_heading`] removes the
//! matching `<h1>` from rendered markup.
//!
//! Only the *leading* heading is ever touched. A `# ` line buried below
//! other content is ordinary body text.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::models::HeadingExtraction;

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``(.+?)``|`([^`]+)`").unwrap());
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\((?:[^()]|\([^()]*\))*\)").unwrap());
static INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((?:[^()]|\([^()]*\))*\)").unwrap());
static REFERENCE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").unwrap());
// Star delimiters need non-whitespace just inside them; `2 * 3` stays literal.
static STRONG_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^\s*](?:.*?[^\s*])?)\*\*").unwrap());
static STRONG_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w])__(.+?)__([^\w]|$)").unwrap());
static STRIKETHROUGH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static EMPHASIS_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^\s*](?:[^*]*?[^\s*])?)\*").unwrap());
static EMPHASIS_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w])_([^_]+?)_([^\w]|$)").unwrap());
static RENDERED_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1(?:\s[^>]*)?>.*?</h1\s*>(?:\r?\n)*").unwrap());

/// Extract a leading `# ` heading from a markdown body.
///
/// Leading blank lines are skipped. Returns `None` when the first
/// non-blank line is not a level-1 heading. On a match the returned body
/// drops the heading line and at most one blank line directly after it.
pub fn extract_leading_heading(markdown: &str) -> Option<HeadingExtraction> {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let index = lines.iter().position(|line| !line.trim().is_empty())?;

    let raw = lines[index].trim_end_matches('\r').strip_prefix("# ")?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut rest = index + 1;
    if lines.get(rest).is_some_and(|line| line.trim().is_empty()) {
        rest += 1;
    }

    Some(HeadingExtraction {
        title: flatten_inline(raw),
        body: lines[rest..].join("\n"),
    })
}

/// Remove the first `<h1>` element (attributes and nested markup included)
/// plus any newlines that directly follow it.
///
/// Callers decide whether the heading is actually leading; this function
/// does not look at document position.
pub fn strip_rendered_heading(html: &str) -> String {
    RENDERED_H1.replacen(html, 1, "").into_owned()
}

/// Flatten inline markdown (images, links, emphasis, strikethrough, code
/// spans) to plain text. `#` characters are left alone.
pub fn flatten_inline(text: &str) -> String {
    let text = IMAGE.replace_all(text, "$1");
    let text = INLINE_LINK.replace_all(&text, "$1");
    let text = REFERENCE_LINK.replace_all(&text, "$1");
    let text: &str = &text;

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in CODE_SPAN.captures_iter(text) {
        let whole = caps.get(0).map_or(last..last, |m| m.range());
        out.push_str(&flatten_formatting(&text[last..whole.start]));
        if let Some(code) = caps.get(1).or_else(|| caps.get(2)) {
            out.push_str(code.as_str().trim());
        }
        last = whole.end;
    }
    out.push_str(&flatten_formatting(&text[last..]));
    out
}

/// Emphasis markers outside code spans.
fn flatten_formatting(segment: &str) -> String {
    let text = STRONG_STAR.replace_all(segment, "$1");
    let text = replace_until_stable(&STRONG_UNDERSCORE, &text);
    let text = STRIKETHROUGH.replace_all(&text, "$1");
    let text = EMPHASIS_STAR.replace_all(&text, "$1");
    replace_until_stable(&EMPHASIS_UNDERSCORE, &text)
}

/// Underscore patterns consume one boundary character on each side, so
/// adjacent spans (`_a_ _b_`) need a second pass.
fn replace_until_stable(pattern: &Regex, text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = pattern.replace_all(&current, |caps: &Captures| {
            format!("{}{}{}", &caps[1], &caps[2], &caps[3])
        });
        match next {
            Cow::Borrowed(_) => return current,
            Cow::Owned(replaced) => current = replaced,
        }
    }
}
