//! Metadata fence handling for content files.
//!
//! A fence is a block at the very top of a file opened and closed by a
//! line consisting of exactly `---`. Everything after the closing line is
//! the markdown body.

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

use crate::models::MetadataRecord;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\x{feff}?---\r?\n(?:([\s\S]*?)\r?\n)?---(?:\r?\n|$)").unwrap()
});

/// Return the body of a content file: the text after the metadata fence,
/// or the whole text if there is no fence. A leading byte order mark is
/// dropped either way.
pub fn body_after_fence(text: &str) -> &str {
    match FENCE.find(text) {
        Some(m) => &text[m.end()..],
        None => strip_bom(text),
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Split a content file into its declared metadata and its body.
///
/// The fence is parsed as YAML. A missing fence or an empty one yields an
/// empty record. `path` only labels the error when the YAML is malformed.
pub fn split_frontmatter<'a>(text: &'a str, path: &Path) -> Result<(MetadataRecord, &'a str)> {
    let Some(caps) = FENCE.captures(text) else {
        return Ok((MetadataRecord::new(), strip_bom(text)));
    };
    let end = caps.get(0).map_or(0, |m| m.end());
    let raw = caps.get(1).map_or("", |m| m.as_str());

    let data = parse_yaml_record(raw)
        .with_context(|| format!("Failed to parse frontmatter in {}", path.display()))?;
    Ok((data, &text[end..]))
}

/// Parse YAML into a record. Blank input and a YAML `null` are empty
/// records; any other non-mapping top level is rejected.
pub(crate) fn parse_yaml_record(raw: &str) -> Result<MetadataRecord> {
    if raw.trim().is_empty() {
        return Ok(MetadataRecord::new());
    }
    let value: Value = serde_yaml::from_str(raw)?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(MetadataRecord::new()),
        other => anyhow::bail!("expected a mapping, found {}", kind_of(&other)),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_after_fence() {
        let text = "---\ntitle: Hello\n---\n# Heading\n\nBody";
        assert_eq!(body_after_fence(text), "# Heading\n\nBody");
    }

    #[test]
    fn test_body_without_fence_is_whole_text() {
        let text = "# Heading\n\nBody";
        assert_eq!(body_after_fence(text), text);
    }

    #[test]
    fn test_bom_dropped_without_fence() {
        assert_eq!(body_after_fence("\u{feff}# Title\n\nBody"), "# Title\n\nBody");
        assert_eq!(body_after_fence("\u{feff}---\na: 1\n---\nBody"), "Body");
        let (data, body) = split_frontmatter("\u{feff}Body", Path::new("a.md")).unwrap();
        assert!(data.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_fence_must_start_the_file() {
        let text = "Intro\n---\ntitle: x\n---\nBody";
        assert_eq!(body_after_fence(text), text);
    }

    #[test]
    fn test_empty_fence() {
        assert_eq!(body_after_fence("---\n---\nBody"), "Body");
    }

    #[test]
    fn test_unclosed_fence_is_body() {
        let text = "---\ntitle: x\nBody";
        assert_eq!(body_after_fence(text), text);
    }

    #[test]
    fn test_longer_dash_line_does_not_close() {
        let text = "---\na: 1\n----\nb: 2\n---\nBody";
        assert_eq!(body_after_fence(text), "Body");
    }

    #[test]
    fn test_crlf_fence() {
        assert_eq!(body_after_fence("---\r\na: 1\r\n---\r\nBody"), "Body");
    }

    #[test]
    fn test_split_frontmatter() {
        let (data, body) =
            split_frontmatter("---\ntitle: Hello\ndraft: true\n---\nBody", Path::new("a.md"))
                .unwrap();
        assert_eq!(Value::Object(data), json!({"title": "Hello", "draft": true}));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_without_fence() {
        let (data, body) = split_frontmatter("Body", Path::new("a.md")).unwrap();
        assert!(data.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_malformed_names_path() {
        let err = split_frontmatter("---\ntitle: [unclosed\n---\nBody", Path::new("docs/a.md"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("docs/a.md"));
    }

    #[test]
    fn test_split_rejects_scalar_frontmatter() {
        assert!(split_frontmatter("---\njust text\n---\nBody", Path::new("a.md")).is_err());
    }
}
