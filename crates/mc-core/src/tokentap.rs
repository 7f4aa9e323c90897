//! Token usage history scraped from tokentap prompt logs.
//!
//! Each `*.md` file in the prompts directory records one LLM request:
//!
//! ```text
//! # Prompt - 2026-01-30 14:05:09
//! **Provider:** anthropic
//! **Model:** claude-sonnet
//! **Tokens:** 12,345
//!
//! ### System
//! ...
//! ### User
//! ...
//! ```
//!
//! Header fields are optional; a timestamp embedded in the file name
//! (`YYYY-MM-DD_HH-MM-SS`) stands in for a missing header, and files with
//! neither are ignored.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokentapEntry {
    pub id: String,
    pub timestamp_iso: String,
    pub timestamp_ms: i64,
    pub date_key: String,
    pub provider: String,
    pub model: String,
    pub tokens: u64,
    pub prompt_preview: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub provider: String,
    pub tokens: u64,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStats {
    pub date: String,
    pub tokens: u64,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokentapSummary {
    pub total_tokens: u64,
    pub total_requests: usize,
    pub active_days: usize,
    pub providers: Vec<ProviderStats>,
    pub days: Vec<DayStats>,
    pub recent: Vec<TokentapEntry>,
    pub first_seen_iso: Option<String>,
    pub last_seen_iso: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokentapHistory {
    pub prompts_dir: String,
    pub entries: Vec<TokentapEntry>,
    pub summary: TokentapSummary,
    pub error: Option<String>,
}

/// Limits applied while parsing and summarizing.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub max_recent: usize,
    pub preview_limit: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_recent: 50,
            preview_limit: 180,
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^#\s*Prompt\s*-\s*(.+)$")
}

fn provider_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^\*\*Provider:\*\*\s*(.+)$")
}

fn model_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^\*\*Model:\*\*\s*(.+)$")
}

fn tokens_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^\*\*Tokens:\*\*\s*(.+)$")
}

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2}):(\d{2})")
}

fn file_timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(\d{4})-(\d{2})-(\d{2})_(\d{2})-(\d{2})-(\d{2})")
}

fn file_provider_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)_([A-Za-z0-9_]+)\.md$")
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('\r'))
}

/// Interpret six captured groups as a wall-clock time in the local zone.
fn local_datetime(re: &Regex, text: &str) -> Option<DateTime<Utc>> {
    let caps = re.captures(text)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, num(2)?, num(3)?)?.and_hms_opt(
        num(4)?,
        num(5)?,
        num(6)?,
    )?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    local_datetime(timestamp_re(), input)
}

pub fn parse_file_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    local_datetime(file_timestamp_re(), file_name)
}

fn provider_from_file(file_name: &str) -> Option<String> {
    capture(file_provider_re(), file_name).map(str::to_lowercase)
}

fn normalize_provider(value: Option<&str>) -> String {
    match value {
        Some(v) => v.trim().to_lowercase(),
        None => "unknown".to_string(),
    }
}

/// Keep only the digits (`"12,345 tokens"` → 12345); anything unparseable is 0.
pub fn parse_tokens(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Pick the last `### User` section (or the last section of any role) and
/// collapse it to a single line of at most `limit` characters.
pub fn extract_prompt_preview(markdown: &str, limit: usize) -> String {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in markdown.lines() {
        if let Some(role) = line.strip_prefix("### ") {
            if let Some(prev) = current.take() {
                sections.push((prev, buffer.join("\n").trim().to_string()));
            }
            current = Some(role.trim().to_lowercase());
            buffer.clear();
            continue;
        }
        if current.is_some() {
            buffer.push(line);
        }
    }
    if let Some(prev) = current {
        sections.push((prev, buffer.join("\n").trim().to_string()));
    }

    let target = sections
        .iter()
        .rev()
        .find(|(role, _)| role.contains("user"))
        .or_else(|| sections.last());

    let Some((_, text)) = target else {
        return String::new();
    };
    if text.is_empty() {
        return String::new();
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= limit {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(limit).collect();
    format!("{truncated}...")
}

/// Parse one prompt log. Returns `None` when no timestamp can be found.
pub fn parse_entry(markdown: &str, file_name: &str, preview_limit: usize) -> Option<TokentapEntry> {
    let header_date = capture(header_re(), markdown).and_then(parse_timestamp);
    let date = header_date.or_else(|| parse_file_timestamp(file_name))?;

    let provider_line = capture(provider_re(), markdown).map(str::to_string);
    let provider = normalize_provider(provider_line.or_else(|| provider_from_file(file_name)).as_deref());
    let model = capture(model_re(), markdown)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("unknown")
        .to_string();
    let tokens = parse_tokens(capture(tokens_re(), markdown));

    let id = strip_md_suffix(file_name);

    Some(TokentapEntry {
        id,
        timestamp_iso: date.to_rfc3339_opts(SecondsFormat::Millis, true),
        timestamp_ms: date.timestamp_millis(),
        date_key: date.format("%Y-%m-%d").to_string(),
        provider,
        model,
        tokens,
        prompt_preview: extract_prompt_preview(markdown, preview_limit),
        file_name: file_name.to_string(),
    })
}

fn strip_md_suffix(file_name: &str) -> String {
    let cut = file_name.len().saturating_sub(3);
    match file_name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".md") => file_name[..cut].to_string(),
        _ => file_name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

pub fn summarize(entries: &[TokentapEntry], max_recent: usize) -> TokentapSummary {
    let mut total_tokens = 0u64;
    let mut providers: Vec<ProviderStats> = Vec::new();
    let mut provider_idx: HashMap<&str, usize> = HashMap::new();
    let mut days: Vec<DayStats> = Vec::new();
    let mut day_idx: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        total_tokens += entry.tokens;

        let i = *provider_idx.entry(entry.provider.as_str()).or_insert_with(|| {
            providers.push(ProviderStats {
                provider: entry.provider.clone(),
                tokens: 0,
                requests: 0,
            });
            providers.len() - 1
        });
        providers[i].tokens += entry.tokens;
        providers[i].requests += 1;

        let d = *day_idx.entry(entry.date_key.as_str()).or_insert_with(|| {
            days.push(DayStats {
                date: entry.date_key.clone(),
                tokens: 0,
                requests: 0,
            });
            days.len() - 1
        });
        days[d].tokens += entry.tokens;
        days[d].requests += 1;
    }

    let mut sorted: Vec<TokentapEntry> = entries.to_vec();
    sorted.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    providers.sort_by(|a, b| b.tokens.cmp(&a.tokens));
    days.sort_by(|a, b| b.date.cmp(&a.date));

    let first_seen_iso = sorted.last().map(|e| e.timestamp_iso.clone());
    let last_seen_iso = sorted.first().map(|e| e.timestamp_iso.clone());
    let active_days = days.len();
    sorted.truncate(max_recent);

    TokentapSummary {
        total_tokens,
        total_requests: entries.len(),
        active_days,
        providers,
        days,
        recent: sorted,
        first_seen_iso,
        last_seen_iso,
    }
}

/// Read every prompt log under `prompts_dir`. A missing or unreadable
/// directory is reported through `error` with an empty summary.
pub fn history(prompts_dir: &Path, opts: ParseOptions) -> TokentapHistory {
    let mut entries = Vec::new();
    let mut error = None;

    match collect_entries(prompts_dir, opts.preview_limit) {
        Ok(found) => entries = found,
        Err(e) => {
            tracing::warn!(dir = %prompts_dir.display(), error = %e, "cannot read tokentap prompts");
            error = Some(e.to_string());
        }
    }

    let summary = summarize(&entries, opts.max_recent);
    TokentapHistory {
        prompts_dir: prompts_dir.display().to_string(),
        entries,
        summary,
        error,
    }
}

fn collect_entries(dir: &Path, preview_limit: usize) -> std::io::Result<Vec<TokentapEntry>> {
    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_lowercase().ends_with(".md") {
            names.push(name);
        }
    }
    names.sort();

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let markdown = match std::fs::read_to_string(dir.join(&name)) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "skipping unreadable prompt log");
                continue;
            }
        };
        if let Some(entry) = parse_entry(&markdown, &name, preview_limit) {
            entries.push(entry);
        } else {
            tracing::debug!(file = %name, "prompt log has no timestamp");
        }
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local_utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    const SAMPLE: &str = "# Prompt - 2026-01-30 14:05:09\n\
**Provider:** Anthropic \n\
**Model:** claude-sonnet\n\
**Tokens:** 12,345\n\
\n\
### System\n\
You are helpful.\n\
### User\n\
Summarize   the\n  weekly report\n\
### Assistant\n\
Sure.\n";

    #[test]
    fn parses_header_fields() {
        let entry = parse_entry(SAMPLE, "2026-01-30_14-05-09_anthropic.md", 180).unwrap();
        let expected = local_utc(2026, 1, 30, 14, 5, 9);
        assert_eq!(entry.id, "2026-01-30_14-05-09_anthropic");
        assert_eq!(entry.timestamp_ms, expected.timestamp_millis());
        assert_eq!(
            entry.timestamp_iso,
            expected.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        assert!(entry.timestamp_iso.ends_with(".000Z"));
        assert_eq!(entry.date_key, expected.format("%Y-%m-%d").to_string());
        assert_eq!(entry.provider, "anthropic");
        assert_eq!(entry.model, "claude-sonnet");
        assert_eq!(entry.tokens, 12345);
        assert_eq!(entry.prompt_preview, "Summarize the weekly report");
    }

    #[test]
    fn falls_back_to_file_name() {
        let md = "no header here\n### Assistant\nonly reply\n";
        let entry = parse_entry(md, "2026-02-01_08-00-00_OpenAI.md", 180).unwrap();
        assert_eq!(entry.timestamp_ms, local_utc(2026, 2, 1, 8, 0, 0).timestamp_millis());
        assert_eq!(entry.provider, "openai");
        assert_eq!(entry.model, "unknown");
        assert_eq!(entry.tokens, 0);
        assert_eq!(entry.prompt_preview, "only reply");
    }

    #[test]
    fn no_timestamp_anywhere_is_skipped() {
        assert!(parse_entry("# Prompt - someday\n", "notes.md", 180).is_none());
    }

    #[test]
    fn unknown_provider_when_absent() {
        let entry = parse_entry("# Prompt - 2026-01-01 00:00:01\n", "log.md", 180).unwrap();
        assert_eq!(entry.provider, "unknown");
        assert_eq!(entry.prompt_preview, "");
    }

    #[test]
    fn preview_truncates_with_ellipsis() {
        let long = format!("### User\n{}", "word ".repeat(100));
        let preview = extract_prompt_preview(&long, 20);
        assert_eq!(preview, "word word word word ...");
        assert_eq!(preview.chars().count(), 23);
    }

    #[test]
    fn preview_prefers_last_user_section() {
        let md = "### User\nfirst\n### Assistant\nreply\n### User (follow-up)\nsecond\n### Tool\nout";
        assert_eq!(extract_prompt_preview(md, 180), "second");
    }

    #[test]
    fn tokens_strip_non_digits() {
        assert_eq!(parse_tokens(Some("1,024 (est.)")), 1024);
        assert_eq!(parse_tokens(Some("n/a")), 0);
        assert_eq!(parse_tokens(None), 0);
    }

    fn entry(id: &str, provider: &str, ms: i64, date: &str, tokens: u64) -> TokentapEntry {
        TokentapEntry {
            id: id.into(),
            timestamp_iso: format!("iso-{ms}"),
            timestamp_ms: ms,
            date_key: date.into(),
            provider: provider.into(),
            model: "m".into(),
            tokens,
            prompt_preview: String::new(),
            file_name: format!("{id}.md"),
        }
    }

    #[test]
    fn summary_aggregates_and_orders() {
        let entries = vec![
            entry("a", "openai", 100, "2026-01-01", 10),
            entry("b", "anthropic", 300, "2026-01-02", 50),
            entry("c", "openai", 200, "2026-01-02", 5),
        ];
        let s = summarize(&entries, 2);
        assert_eq!(s.total_tokens, 65);
        assert_eq!(s.total_requests, 3);
        assert_eq!(s.active_days, 2);
        assert_eq!(s.providers[0].provider, "anthropic");
        assert_eq!(s.providers[1].tokens, 15);
        assert_eq!(s.providers[1].requests, 2);
        assert_eq!(s.days[0].date, "2026-01-02");
        assert_eq!(s.days[0].requests, 2);
        let recent: Vec<&str> = s.recent.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(recent, vec!["b", "c"]);
        assert_eq!(s.first_seen_iso.as_deref(), Some("iso-100"));
        assert_eq!(s.last_seen_iso.as_deref(), Some("iso-300"));
    }

    #[test]
    fn empty_summary() {
        let s = summarize(&[], 50);
        assert_eq!(s.total_tokens, 0);
        assert!(s.recent.is_empty());
        assert!(s.first_seen_iso.is_none());
    }

    #[test]
    fn history_reads_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2026-01-30_14-05-09_anthropic.md"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("undated.md"), "nothing").unwrap();

        let h = history(dir.path(), ParseOptions::default());
        assert!(h.error.is_none());
        assert_eq!(h.entries.len(), 1);
        assert_eq!(h.summary.total_tokens, 12345);

        let json = serde_json::to_value(&h).unwrap();
        assert!(json["promptsDir"].is_string());
        assert_eq!(json["summary"]["totalRequests"], 1);
        assert_eq!(json["entries"][0]["promptPreview"], "Summarize the weekly report");
    }

    #[test]
    fn history_missing_dir_reports_error() {
        let dir = TempDir::new().unwrap();
        let h = history(&dir.path().join("absent"), ParseOptions::default());
        assert!(h.error.is_some());
        assert!(h.entries.is_empty());
        assert_eq!(h.summary.total_requests, 0);
    }
}
