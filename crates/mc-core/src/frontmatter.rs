//! YAML frontmatter for vault documents.
//!
//! A document may begin with a `---` fenced YAML block. Only `title`, `date`
//! and `tags` have meaning to the vault; any other keys are surfaced to
//! readers through `extra` but are not written back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const FENCE: &str = "---";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocFrontmatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DocFrontmatter {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none() && self.tags.is_none() && self.extra.is_empty()
    }

    /// Build frontmatter from an arbitrary JSON object, keeping whatever is
    /// usable: scalar titles and dates are stringified, `tags` may be a list
    /// or a single scalar. Non-object input yields empty frontmatter.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        from_map(obj)
    }
}

fn from_map(obj: &Map<String, Value>) -> DocFrontmatter {
    let mut fm = DocFrontmatter::default();
    for (key, value) in obj {
        match key.as_str() {
            "title" if scalar_string(value).is_some() => fm.title = scalar_string(value),
            "date" if scalar_string(value).is_some() => fm.date = scalar_string(value),
            "tags" => fm.tags = tag_list(value),
            _ => {
                fm.extra.insert(key.clone(), value.clone());
            }
        }
    }
    fm
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn tag_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(scalar_string).collect()),
        Value::Null => None,
        other => scalar_string(other).map(|s| vec![s]),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Failure to interpret the fenced block as a YAML mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterError(pub String);

/// Split `raw` into frontmatter and body.
///
/// Without an opening and closing fence the whole input is body. The line
/// break after the closing fence, and one blank separator line, belong to the
/// header.
pub fn parse(raw: &str) -> Result<(DocFrontmatter, String), FrontmatterError> {
    let Some((yaml, body)) = split_fenced(raw) else {
        return Ok((DocFrontmatter::default(), raw.to_string()));
    };

    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    if yaml.trim().is_empty() {
        return Ok((DocFrontmatter::default(), body.to_string()));
    }

    let parsed: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError(e.to_string()))?;
    let fm = match parsed {
        serde_yaml::Value::Null => DocFrontmatter::default(),
        serde_yaml::Value::Mapping(_) => {
            let json = yaml_to_json(parsed)?;
            DocFrontmatter::from_json(&json)
        }
        _ => {
            return Err(FrontmatterError(
                "frontmatter must be a YAML mapping".to_string(),
            ))
        }
    };
    Ok((fm, body.to_string()))
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, FrontmatterError> {
    serde_json::to_value(value).map_err(|e| FrontmatterError(e.to_string()))
}

/// Return `(yaml, rest)` when `raw` opens with a fence line and a closing
/// fence line follows. `rest` starts right after the closing fence's line.
fn split_fenced(raw: &str) -> Option<(&str, &str)> {
    let first_end = raw.find('\n')?;
    if raw[..first_end].trim_end() != FENCE {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut pos = yaml_start;
    while pos <= raw.len() {
        let line_end = raw[pos..].find('\n').map(|i| pos + i);
        let line = &raw[pos..line_end.unwrap_or(raw.len())];
        if line.trim_end() == FENCE {
            let rest_start = line_end.map(|i| i + 1).unwrap_or(raw.len());
            return Some((&raw[yaml_start..pos], &raw[rest_start..]));
        }
        match line_end {
            Some(i) => pos = i + 1,
            None => break,
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Render the header written in front of a document body. Values are JSON
/// string literals, which YAML reads back verbatim. Returns an empty string
/// when there is nothing to write.
pub fn serialize(fm: &DocFrontmatter) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(title) = fm.title.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("title: {}", json_string(title)));
    }
    if let Some(date) = fm.date.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("date: {}", json_string(date)));
    }
    if let Some(tags) = &fm.tags {
        let tags: Vec<String> = tags
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| json_string(t))
            .collect();
        if !tags.is_empty() {
            lines.push(format!("tags: [{}]", tags.join(", ")));
        }
    }

    if lines.is_empty() {
        return String::new();
    }
    format!("{FENCE}\n{}\n{FENCE}\n\n", lines.join("\n"))
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_fence_is_all_body() {
        let (fm, body) = parse("# Heading\n\ntext").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "# Heading\n\ntext");
    }

    #[test]
    fn unclosed_fence_is_all_body() {
        let raw = "---\ntitle: x\nno closing";
        let (fm, body) = parse(raw).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn parses_title_date_tags_and_extra() {
        let raw = "---\ntitle: Weekly Review\ndate: 2026-01-30\ntags: [ops, review]\nmood: calm\n---\nBody here\n";
        let (fm, body) = parse(raw).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Weekly Review"));
        assert_eq!(fm.date.as_deref(), Some("2026-01-30"));
        assert_eq!(fm.tags, Some(vec!["ops".to_string(), "review".to_string()]));
        assert_eq!(fm.extra.get("mood"), Some(&json!("calm")));
        assert_eq!(body, "Body here\n");
    }

    #[test]
    fn single_tag_scalar_becomes_list() {
        let (fm, _) = parse("---\ntags: solo\n---\n").unwrap();
        assert_eq!(fm.tags, Some(vec!["solo".to_string()]));
    }

    #[test]
    fn numeric_title_is_stringified() {
        let (fm, _) = parse("---\ntitle: 2026\n---\nx").unwrap();
        assert_eq!(fm.title.as_deref(), Some("2026"));
    }

    #[test]
    fn empty_block_is_empty_frontmatter() {
        let (fm, body) = parse("---\n---\nhello").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "hello");
    }

    #[test]
    fn non_mapping_yaml_is_rejected() {
        assert!(parse("---\n- a\n- b\n---\nbody").is_err());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(parse("---\ntitle: [unclosed\n---\nbody").is_err());
    }

    #[test]
    fn crlf_documents_parse() {
        let (fm, body) = parse("---\r\ntitle: Win\r\n---\r\n\r\nbody\r\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Win"));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn serialize_writes_json_literals() {
        let fm = DocFrontmatter {
            title: Some("He said \"hi\"".into()),
            date: Some("2026-01-30".into()),
            tags: Some(vec!["a".into(), String::new(), "b c".into()]),
            extra: BTreeMap::new(),
        };
        assert_eq!(
            serialize(&fm),
            "---\ntitle: \"He said \\\"hi\\\"\"\ndate: \"2026-01-30\"\ntags: [\"a\", \"b c\"]\n---\n\n"
        );
    }

    #[test]
    fn serialize_empty_is_blank() {
        assert_eq!(serialize(&DocFrontmatter::default()), "");
        let only_empty_tags = DocFrontmatter {
            tags: Some(vec![String::new()]),
            ..Default::default()
        };
        assert_eq!(serialize(&only_empty_tags), "");
    }

    #[test]
    fn written_header_reads_back() {
        let fm = DocFrontmatter {
            title: Some("Plan".into()),
            tags: Some(vec!["q1".into()]),
            ..Default::default()
        };
        let raw = format!("{}# Plan\n", serialize(&fm));
        let (parsed, body) = parse(&raw).unwrap();
        assert_eq!(parsed, fm);
        assert_eq!(body, "# Plan\n");
    }

    #[test]
    fn from_json_ignores_non_objects() {
        assert!(DocFrontmatter::from_json(&json!("nope")).is_empty());
        let fm = DocFrontmatter::from_json(&json!({"title": "T", "tags": ["x", 1, null]}));
        assert_eq!(fm.title.as_deref(), Some("T"));
        assert_eq!(fm.tags, Some(vec!["x".to_string(), "1".to_string()]));
    }
}
