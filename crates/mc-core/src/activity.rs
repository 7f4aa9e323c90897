use crate::error::{McError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// ActivityType / ActivityStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Tool,
    Exec,
    File,
    Api,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Tool => "tool",
            ActivityType::Exec => "exec",
            ActivityType::File => "file",
            ActivityType::Api => "api",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tool" => Ok(ActivityType::Tool),
            "exec" => Ok(ActivityType::Exec),
            "file" => Ok(ActivityType::File),
            "api" => Ok(ActivityType::Api),
            other => Err(McError::InvalidActivityType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Error,
    Pending,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Error => "error",
            ActivityStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(ActivityStatus::Success),
            "error" => Ok(ActivityStatus::Error),
            "pending" => Ok(ActivityStatus::Pending),
            other => Err(McError::InvalidActivityStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub action: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    pub status: ActivityStatus,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub kind: ActivityType,
    pub action: String,
    pub details: String,
    pub tokens: Option<u64>,
    pub status: ActivityStatus,
}

// ---------------------------------------------------------------------------
// ActivityLog: append-only JSON lines file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(root: &Path) -> Self {
        Self::new(crate::paths::activity_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an activity stamped with the current time; returns its id.
    pub fn log(&self, new: NewActivity) -> Result<String> {
        let activity = Activity {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind: new.kind,
            action: new.action,
            details: new.details,
            tokens: new.tokens,
            status: new.status,
        };
        self.append(&activity)?;
        Ok(activity.id)
    }

    pub fn append(&self, activity: &Activity) -> Result<()> {
        let line = serde_json::to_string(activity)?;
        crate::io::append_line(&self.path, &line)
    }

    /// Most recent first. `limit` defaults to 50.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<Activity>> {
        self.query(None, limit)
    }

    pub fn list_by_type(&self, kind: ActivityType, limit: Option<usize>) -> Result<Vec<Activity>> {
        self.query(Some(kind), limit)
    }

    fn query(&self, kind: Option<ActivityType>, limit: Option<usize>) -> Result<Vec<Activity>> {
        let mut all = self.load_all()?;
        if let Some(kind) = kind {
            all.retain(|a| a.kind == kind);
        }
        // Newest first; for equal timestamps the later append wins.
        all.reverse();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all.truncate(limit.unwrap_or(DEFAULT_LIMIT));
        Ok(all)
    }

    fn load_all(&self) -> Result<Vec<Activity>> {
        let Some(data) = crate::io::read_optional(&self.path)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for (lineno, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Activity>(line) {
                Ok(a) => out.push(a),
                Err(e) => tracing::warn!(
                    file = %self.path.display(),
                    line = lineno + 1,
                    error = %e,
                    "skipping malformed activity"
                ),
            }
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn activity(id: &str, ts: i64, kind: ActivityType) -> Activity {
        Activity {
            id: id.into(),
            timestamp: ts,
            kind,
            action: format!("action-{id}"),
            details: String::new(),
            tokens: None,
            status: ActivityStatus::Success,
        }
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = ActivityLog::open(dir.path());
        assert!(log.list(None).unwrap().is_empty());
    }

    #[test]
    fn log_assigns_id_and_timestamp() {
        let dir = TempDir::new().unwrap();
        let log = ActivityLog::open(dir.path());
        let id = log
            .log(NewActivity {
                kind: ActivityType::Tool,
                action: "web_search".into(),
                details: "Searched for agents".into(),
                tokens: Some(1250),
                status: ActivityStatus::Success,
            })
            .unwrap();
        let all = log.list(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].tokens, Some(1250));
        assert!(all[0].timestamp > 0);
    }

    #[test]
    fn list_orders_newest_first_and_limits() {
        let dir = TempDir::new().unwrap();
        let log = ActivityLog::open(dir.path());
        log.append(&activity("old", 100, ActivityType::Exec)).unwrap();
        log.append(&activity("new", 300, ActivityType::File)).unwrap();
        log.append(&activity("mid", 200, ActivityType::Exec)).unwrap();

        let ids: Vec<String> = log.list(Some(2)).unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["new", "mid"]);

        let execs: Vec<String> = log
            .list_by_type(ActivityType::Exec, None)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(execs, vec!["mid", "old"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let log = ActivityLog::open(dir.path());
        log.append(&activity("ok", 1, ActivityType::Api)).unwrap();
        crate::io::append_line(log.path(), "{not json").unwrap();
        assert_eq!(log.list(None).unwrap().len(), 1);
    }

    #[test]
    fn serialized_shape_uses_type_key() {
        let json = serde_json::to_value(activity("x", 5, ActivityType::Api)).unwrap();
        assert_eq!(json["type"], "api");
        assert_eq!(json["status"], "success");
        assert!(json.get("tokens").is_none());
    }

    #[test]
    fn parse_type_and_status() {
        assert_eq!("exec".parse::<ActivityType>().unwrap(), ActivityType::Exec);
        assert!("shell".parse::<ActivityType>().is_err());
        assert_eq!("pending".parse::<ActivityStatus>().unwrap(), ActivityStatus::Pending);
        assert!("done".parse::<ActivityStatus>().is_err());
    }
}
