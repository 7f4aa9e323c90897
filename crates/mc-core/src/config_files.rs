use serde::Serialize;
use std::path::Path;

pub const MISSING_CONTENT: &str = "(File not found or empty)";

/// The agent configuration files shown on the config panel, in display order.
pub const CONFIG_FILES: &[(&str, &str)] = &[
    ("SOUL.md", "Personality, values, and behavioral guidelines"),
    ("IDENTITY.md", "Core identity - name, role, vibe"),
    ("USER.md", "Information about the user and working context"),
    ("MEMORY.md", "Curated long-term memory and important context"),
    ("AGENTS.md", "System operations manual and protocols"),
    ("TOOLS.md", "Local tool notes and environment-specific info"),
    ("HEARTBEAT.md", "Periodic check tasks (runs every ~30 minutes)"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigFile {
    pub name: String,
    pub path: String,
    pub description: String,
    pub content: String,
    pub lines: usize,
    pub words: usize,
}

/// Read every panel file from `dir`. Unreadable files still get an entry.
pub fn read_all(dir: &Path) -> Vec<ConfigFile> {
    CONFIG_FILES
        .iter()
        .map(|(name, description)| read_one(dir, name, description))
        .collect()
}

fn read_one(dir: &Path, name: &str, description: &str) -> ConfigFile {
    let (content, lines, words) = match std::fs::read_to_string(dir.join(name)) {
        Ok(content) => {
            let lines = content.split('\n').count();
            let words = content.split_whitespace().count();
            (content, lines, words)
        }
        Err(e) => {
            tracing::warn!(file = name, error = %e, "config file unavailable");
            (MISSING_CONTENT.to_string(), 0, 0)
        }
    };
    ConfigFile {
        name: name.to_string(),
        path: name.to_string(),
        description: description.to_string(),
        content,
        lines,
        words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn counts_lines_and_words() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("SOUL.md"), "# Soul\n\nBe  curious\tand kind.\n").unwrap();
        let files = read_all(dir.path());
        assert_eq!(files.len(), 7);
        let soul = &files[0];
        assert_eq!(soul.name, "SOUL.md");
        assert_eq!(soul.lines, 4);
        assert_eq!(soul.words, 6);
    }

    #[test]
    fn missing_files_get_placeholder() {
        let dir = TempDir::new().unwrap();
        let files = read_all(dir.path());
        let heartbeat = files.iter().find(|f| f.name == "HEARTBEAT.md").unwrap();
        assert_eq!(heartbeat.content, MISSING_CONTENT);
        assert_eq!(heartbeat.lines, 0);
        assert_eq!(heartbeat.words, 0);
    }

    #[test]
    fn empty_file_counts_one_line() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("USER.md"), "").unwrap();
        let user = read_all(dir.path()).into_iter().find(|f| f.name == "USER.md").unwrap();
        assert_eq!(user.content, "");
        assert_eq!(user.lines, 1);
        assert_eq!(user.words, 0);
    }
}
