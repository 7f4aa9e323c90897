use crate::error::{McError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MC_DIR: &str = ".mission-control";
pub const CONFIG_FILE: &str = ".mission-control/config.yaml";
pub const ACTIVITY_FILE: &str = ".mission-control/activities.jsonl";
pub const BOARD_FILE: &str = ".mission-control/board.yaml";

pub const DEFAULT_DOCS_DIR: &str = "documents";
pub const DEFAULT_CONFIG_DIR: &str = "public/config";
pub const DEFAULT_LEDGER_DIR: &str = ".mission-control/usage";
pub const DEFAULT_MEMORY_DIR: &str = "~/clawd";
pub const DEFAULT_CRON_STORE: &str = "~/.clawdbot/cron-store.json";
pub const DEFAULT_PROMPTS_DIR: &str = "~/.tokentap/prompts";

pub const MEMORY_MD: &str = "MEMORY.md";
pub const MEMORY_SUBDIR: &str = "memory";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn mc_dir(root: &Path) -> PathBuf {
    root.join(MC_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn activity_path(root: &Path) -> PathBuf {
    root.join(ACTIVITY_FILE)
}

pub fn board_path(root: &Path) -> PathBuf {
    root.join(BOARD_FILE)
}

pub fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or(McError::HomeNotFound)
}

/// Resolve a configured path: `~/` expands to the home directory, absolute
/// paths are kept, anything else is joined onto `root`.
pub fn resolve_configured(root: &Path, raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return home_dir();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return Ok(home_dir()?.join(rest));
    }
    let p = Path::new(raw);
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        Ok(root.join(p))
    }
}

/// Render a path for display, abbreviating the home directory to `~`.
pub fn display_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.to_string_lossy().replace('\\', "/"));
        }
    }
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
