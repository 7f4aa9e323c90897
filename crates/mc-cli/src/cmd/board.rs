use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::Local;
use clap::Subcommand;
use mc_core::board::{columns, parse_tags, Board, BoardTask, NewTask, Priority, TaskEdit, TaskStatus};
use std::path::Path;

#[derive(Subcommand)]
pub enum BoardSubcommand {
    /// Show the board, optionally filtered
    List {
        /// Match title, description or tags
        #[arg(long, short = 'q', default_value = "")]
        query: String,
        /// Category name, or `all`
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// Add a task
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// backlog, todo, in-progress, review or done
        #[arg(long, default_value = "backlog")]
        status: String,
        /// low, medium, high or urgent
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Move a task to another column
    Move { id: String, status: String },
    /// Edit task fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
    },
    /// Remove a task
    Rm { id: String },
    /// Completion statistics
    Stats,
}

pub fn run(root: &Path, subcmd: BoardSubcommand, json: bool) -> anyhow::Result<()> {
    let mut board = Board::load(root).context("failed to load board")?;
    match subcmd {
        BoardSubcommand::List { query, category } => list(&board, &query, &category, json),
        BoardSubcommand::Add {
            title,
            description,
            status,
            priority,
            category,
            tags,
        } => {
            let new = NewTask {
                title: title.join(" "),
                description,
                status: status.parse::<TaskStatus>()?,
                priority: priority.parse::<Priority>()?,
                category,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
            };
            let task = board.add(new).clone();
            save(&board, root)?;
            report(&task, &format!("Added task [{}]: {}", task.id, task.title), json)
        }
        BoardSubcommand::Move { id, status } => {
            let status = status.parse::<TaskStatus>()?;
            let task = board.move_task(&id, status)?.clone();
            save(&board, root)?;
            report(&task, &format!("Moved [{id}] to {}", status.label()), json)
        }
        BoardSubcommand::Edit {
            id,
            title,
            description,
            priority,
            category,
            tags,
        } => {
            let edit = TaskEdit {
                title,
                description,
                priority: priority.as_deref().map(str::parse::<Priority>).transpose()?,
                category,
                tags: tags.as_deref().map(parse_tags),
            };
            let task = board.edit(&id, edit)?.clone();
            save(&board, root)?;
            report(&task, &format!("Updated [{id}]"), json)
        }
        BoardSubcommand::Rm { id } => {
            let task = board.remove(&id)?;
            save(&board, root)?;
            report(&task, &format!("Removed [{id}]: {}", task.title), json)
        }
        BoardSubcommand::Stats => stats(&board, json),
    }
}

fn save(board: &Board, root: &Path) -> anyhow::Result<()> {
    board.save(root).context("failed to save board")
}

fn report(task: &BoardTask, message: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(task)
    } else {
        println!("{message}");
        Ok(())
    }
}

fn list(board: &Board, query: &str, category: &str, json: bool) -> anyhow::Result<()> {
    let filtered = board.filter(query, category);
    let columns = columns(&filtered);
    if json {
        return print_json(&serde_json::json!({ "columns": columns }));
    }
    if filtered.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for column in columns.iter().filter(|c| !c.tasks.is_empty()) {
        println!("{} ({})", column.label, column.tasks.len());
        let rows = column
            .tasks
            .iter()
            .map(|t| {
                vec![
                    t.id.clone(),
                    t.priority.to_string(),
                    truncate(&t.title, 50),
                    t.category.clone(),
                    t.tags.join(","),
                ]
            })
            .collect();
        print_table(&["ID", "PRIORITY", "TITLE", "CATEGORY", "TAGS"], rows);
        println!();
    }
    Ok(())
}

fn stats(board: &Board, json: bool) -> anyhow::Result<()> {
    let stats = board.stats(Local::now().date_naive());
    if json {
        return print_json(&stats);
    }
    println!("Total:           {}", stats.total);
    println!("In progress:     {}", stats.in_progress);
    println!("Done:            {}", stats.done);
    println!("Completed today: {}", stats.completed_today);
    println!("Completion rate: {}%", stats.completion_rate);
    Ok(())
}
