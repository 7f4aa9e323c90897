//! Substring search over the agent's memory files and the document vault.

use crate::paths::{self, MEMORY_MD, MEMORY_SUBDIR};
use serde::Serialize;
use std::fs::DirEntry;
use std::path::Path;

pub const MAX_RESULTS: usize = 50;
const SNIPPET_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Memory,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub title: String,
    pub snippet: String,
    pub path: String,
    pub score: f64,
}

/// Run `query` against `memory_root` (its `MEMORY.md` and `memory/*.md`)
/// and every `.md` file under `docs_root`. Missing sources contribute nothing.
pub fn search(memory_root: &Path, docs_root: &Path, query: &str) -> Vec<SearchResult> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let mut results = Vec::new();

    let memory_md = memory_root.join(MEMORY_MD);
    if let Some(snippet) = match_file(&memory_md, &needle) {
        results.push(SearchResult {
            id: "memory-1".to_string(),
            kind: ResultKind::Memory,
            title: MEMORY_MD.to_string(),
            snippet,
            path: paths::display_path(&memory_md),
            score: 0.9,
        });
    }

    let memory_dir = memory_root.join(MEMORY_SUBDIR);
    for entry in sorted_entries(&memory_dir) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".md") {
            continue;
        }
        let file = memory_dir.join(&name);
        if !file.is_file() {
            continue;
        }
        if let Some(snippet) = match_file(&file, &needle) {
            results.push(SearchResult {
                id: format!("memory-{name}"),
                kind: ResultKind::Memory,
                title: name.clone(),
                snippet,
                path: paths::display_path(&file),
                score: 0.8,
            });
        }
    }

    search_docs(docs_root, "", &needle, &mut results);

    // Stable sort keeps discovery order within a score band.
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(MAX_RESULTS);
    results
}

fn search_docs(dir: &Path, base: &str, needle: &str, out: &mut Vec<SearchResult>) {
    for entry in sorted_entries(dir) {
        let name = entry.file_name().to_string_lossy().into_owned();
        let full = entry.path();
        let rel = if base.is_empty() {
            name.clone()
        } else {
            format!("{base}/{name}")
        };
        // Symlinked directories are not followed.
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            search_docs(&full, &rel, needle, out);
        } else if name.ends_with(".md") {
            if let Some(snippet) = match_file(&full, needle) {
                out.push(SearchResult {
                    id: format!("doc-{rel}"),
                    kind: ResultKind::Document,
                    title: name.replacen(".md", "", 1),
                    snippet,
                    path: rel,
                    score: 0.7,
                });
            }
        }
    }
}

fn sorted_entries(dir: &Path) -> Vec<DirEntry> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<DirEntry> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    entries
}

/// `Some(snippet)` when the file contains `needle` (already lower-cased).
fn match_file(path: &Path, needle: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    snippet(&content, needle)
}

fn snippet(content: &str, needle: &str) -> Option<String> {
    if !content.to_lowercase().contains(needle) {
        return None;
    }
    let lines: Vec<&str> = content
        .split('\n')
        .filter(|line| line.to_lowercase().contains(needle))
        .take(SNIPPET_LINES)
        .collect();
    Some(lines.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TempDir) {
        let memory = TempDir::new().unwrap();
        std::fs::write(
            memory.path().join("MEMORY.md"),
            "# Memory\nRust is the plan\nnothing here\nrust again\nRUST thrice\nrust four\n",
        )
        .unwrap();
        std::fs::create_dir_all(memory.path().join("memory")).unwrap();
        std::fs::write(memory.path().join("memory/2026-01-02.md"), "learned rust macros\n").unwrap();
        std::fs::write(memory.path().join("memory/notes.txt"), "rust but not markdown\n").unwrap();

        let docs = TempDir::new().unwrap();
        std::fs::create_dir_all(docs.path().join("journal")).unwrap();
        std::fs::write(docs.path().join("journal/day.md"), "Wrote some Rust today\n").unwrap();
        std::fs::write(docs.path().join("other.md"), "unrelated\n").unwrap();
        (memory, docs)
    }

    #[test]
    fn empty_query_returns_nothing() {
        let (memory, docs) = setup();
        assert!(search(memory.path(), docs.path(), "").is_empty());
    }

    #[test]
    fn results_are_scored_and_ordered() {
        let (memory, docs) = setup();
        let results = search(memory.path(), docs.path(), "rust");
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["memory-1", "memory-2026-01-02.md", "doc-journal/day.md"]);
        assert_eq!(results[0].snippet, "Rust is the plan rust again RUST thrice");
        assert_eq!(results[2].title, "day");
        assert_eq!(results[2].path, "journal/day.md");
        assert_eq!(results[2].kind, ResultKind::Document);
    }

    #[test]
    fn missing_sources_are_skipped() {
        let dir = TempDir::new().unwrap();
        let results = search(&dir.path().join("nope"), &dir.path().join("docs"), "rust");
        assert!(results.is_empty());
    }

    #[test]
    fn results_are_capped() {
        let memory = TempDir::new().unwrap();
        let docs = TempDir::new().unwrap();
        for i in 0..60 {
            std::fs::write(docs.path().join(format!("note-{i:02}.md")), "needle\n").unwrap();
        }
        assert_eq!(search(memory.path(), docs.path(), "needle").len(), MAX_RESULTS);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_folders_are_not_followed() {
        let memory = TempDir::new().unwrap();
        let docs = TempDir::new().unwrap();
        std::fs::write(docs.path().join("a.md"), "needle\n").unwrap();
        std::os::unix::fs::symlink(docs.path(), docs.path().join("loop")).unwrap();

        let results = search(memory.path(), docs.path(), "needle");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "a.md");
    }
}
