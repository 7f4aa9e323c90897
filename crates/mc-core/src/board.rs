//! Project kanban board persisted as `.mission-control/board.yaml`.

use crate::error::{McError, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Status / Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// Board columns, left to right.
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Backlog,
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Done,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        TaskStatus::all()
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| McError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(McError::InvalidPriority(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BoardTask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category: String,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Backlog,
            priority: Priority::Medium,
            category: String::new(),
            tags: Vec::new(),
        }
    }
}

/// Field updates; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub id: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<BoardTask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub in_progress: usize,
    pub done: usize,
    pub completed_today: usize,
    /// Percent of tasks done, rounded.
    pub completion_rate: u32,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub tasks: Vec<BoardTask>,
}

impl Board {
    /// A missing board file is an empty board.
    pub fn load(root: &Path) -> Result<Self> {
        match crate::io::read_optional(&crate::paths::board_path(root))? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Board::default()),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&crate::paths::board_path(root), data.as_bytes())
    }

    pub fn get(&self, id: &str) -> Result<&BoardTask> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| McError::TaskNotFound(id.to_string()))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut BoardTask> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| McError::TaskNotFound(id.to_string()))
    }

    fn next_id(&self) -> String {
        let max = self
            .tasks
            .iter()
            .filter_map(|t| t.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }

    pub fn add(&mut self, new: NewTask) -> &BoardTask {
        let now = Utc::now();
        let task = BoardTask {
            id: self.next_id(),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            category: new.category,
            created_at: now,
            completed_at: (new.status == TaskStatus::Done).then_some(now),
            tags: new.tags,
        };
        self.tasks.push(task);
        &self.tasks[self.tasks.len() - 1]
    }

    /// Entering `done` stamps `completed_at`; leaving it clears the stamp.
    pub fn move_task(&mut self, id: &str, status: TaskStatus) -> Result<&BoardTask> {
        let task = self.find_mut(id)?;
        if status == TaskStatus::Done && task.status != TaskStatus::Done {
            task.completed_at = Some(Utc::now());
        } else if status != TaskStatus::Done {
            task.completed_at = None;
        }
        task.status = status;
        Ok(task)
    }

    pub fn edit(&mut self, id: &str, edit: TaskEdit) -> Result<&BoardTask> {
        let task = self.find_mut(id)?;
        if let Some(title) = edit.title {
            task.title = title;
        }
        if let Some(description) = edit.description {
            task.description = description;
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }
        if let Some(category) = edit.category {
            task.category = category;
        }
        if let Some(tags) = edit.tags {
            task.tags = tags;
        }
        Ok(task)
    }

    pub fn remove(&mut self, id: &str) -> Result<BoardTask> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| McError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    /// Tasks matching `query` (title, description or any tag) within
    /// `category` (`all` or empty matches every category).
    pub fn filter(&self, query: &str, category: &str) -> Vec<&BoardTask> {
        let q = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| {
                q.is_empty()
                    || t.title.to_lowercase().contains(&q)
                    || t.description.to_lowercase().contains(&q)
                    || t.tags.iter().any(|tag| tag.to_lowercase().contains(&q))
            })
            .filter(|t| {
                category.is_empty()
                    || category.eq_ignore_ascii_case("all")
                    || t.category.to_lowercase() == category.to_lowercase()
            })
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = self
            .tasks
            .iter()
            .map(|t| t.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        cats.sort();
        cats.dedup();
        cats
    }

    pub fn stats(&self, today: NaiveDate) -> BoardStats {
        let total = self.tasks.len();
        let in_progress = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count();
        let done = self.tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
        let completed_today = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .filter_map(|t| t.completed_at)
            .filter(|at| at.with_timezone(&Local).date_naive() == today)
            .count();
        let completion_rate = if total == 0 {
            0
        } else {
            (done as f64 / total as f64 * 100.0).round() as u32
        };
        BoardStats {
            total,
            in_progress,
            done,
            completed_today,
            completion_rate,
        }
    }
}

/// Group `tasks` by status in column order.
pub fn columns(tasks: &[&BoardTask]) -> Vec<BoardColumn> {
    TaskStatus::all()
        .iter()
        .map(|&status| BoardColumn {
            id: status,
            label: status.label(),
            tasks: tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| (*t).clone())
                .collect(),
        })
        .collect()
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Board {
        let mut board = Board::default();
        board.add(NewTask {
            title: "Build project management system".into(),
            description: "Kanban-style tracking".into(),
            status: TaskStatus::InProgress,
            priority: Priority::High,
            category: "Infrastructure".into(),
            tags: vec!["kanban".into(), "ui".into()],
        });
        board.add(NewTask {
            title: "Integrate Suno music API".into(),
            category: "API Integration".into(),
            status: TaskStatus::Todo,
            tags: vec!["music".into()],
            ..NewTask::new("")
        });
        board.add(NewTask {
            category: "Marketing".into(),
            status: TaskStatus::Done,
            ..NewTask::new("Promo video")
        });
        board
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let board = sample();
        let ids: Vec<&str> = board.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(board.tasks[2].completed_at.is_some());
    }

    #[test]
    fn move_stamps_and_clears_completion() {
        let mut board = sample();
        board.move_task("2", TaskStatus::Done).unwrap();
        assert!(board.get("2").unwrap().completed_at.is_some());
        board.move_task("2", TaskStatus::Review).unwrap();
        assert!(board.get("2").unwrap().completed_at.is_none());
        assert!(matches!(
            board.move_task("99", TaskStatus::Done),
            Err(McError::TaskNotFound(_))
        ));
    }

    #[test]
    fn edit_and_remove() {
        let mut board = sample();
        board
            .edit(
                "1",
                TaskEdit {
                    priority: Some(Priority::Urgent),
                    tags: Some(vec!["ops".into()]),
                    ..TaskEdit::default()
                },
            )
            .unwrap();
        let t = board.get("1").unwrap();
        assert_eq!(t.priority, Priority::Urgent);
        assert_eq!(t.tags, vec!["ops"]);
        assert_eq!(t.title, "Build project management system");

        let removed = board.remove("1").unwrap();
        assert_eq!(removed.id, "1");
        assert_eq!(board.tasks.len(), 2);
        assert!(board.remove("1").is_err());
        // ids keep increasing after removal of a lower id
        assert_eq!(board.add(NewTask::new("next")).id, "4");
    }

    #[test]
    fn filter_matches_text_tags_and_category() {
        let board = sample();
        assert_eq!(board.filter("", "all").len(), 3);
        assert_eq!(board.filter("KANBAN", "all")[0].id, "1");
        assert_eq!(board.filter("music", "")[0].id, "2");
        assert_eq!(board.filter("", "marketing")[0].id, "3");
        assert!(board.filter("music", "Marketing").is_empty());
    }

    #[test]
    fn columns_follow_status_order() {
        let board = sample();
        let all: Vec<&BoardTask> = board.tasks.iter().collect();
        let cols = columns(&all);
        let ids: Vec<&str> = cols.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["backlog", "todo", "in-progress", "review", "done"]);
        assert_eq!(cols[2].tasks.len(), 1);
        assert_eq!(cols[1].label, "To Do");
    }

    #[test]
    fn stats_count_and_round() {
        let board = sample();
        let today = Local::now().date_naive();
        let stats = board.stats(today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.completed_today, 1);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(Board::default().stats(today), BoardStats::default());
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        assert!(Board::load(dir.path()).unwrap().tasks.is_empty());
        let board = sample();
        board.save(dir.path()).unwrap();
        let loaded = Board::load(dir.path()).unwrap();
        assert_eq!(loaded.tasks, board.tasks);
        let yaml = std::fs::read_to_string(crate::paths::board_path(dir.path())).unwrap();
        assert!(yaml.contains("status: in-progress"));
    }

    #[test]
    fn parse_status_priority_and_tags() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("doing".parse::<TaskStatus>().is_err());
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert!("p0".parse::<Priority>().is_err());
        assert_eq!(parse_tags(" a, ,b "), vec!["a", "b"]);
    }
}
