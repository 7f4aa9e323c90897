use crate::output::{print_json, print_table, truncate};
use chrono::{Local, TimeZone};
use clap::Subcommand;
use mc_core::activity::{ActivityLog, ActivityStatus, ActivityType, NewActivity};
use std::path::Path;

#[derive(Subcommand)]
pub enum ActivitySubcommand {
    /// Show the most recent activities
    List {
        /// Only this type: tool, exec, file or api
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
        #[arg(long, default_value_t = mc_core::activity::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Append an activity to the feed
    Log {
        /// tool, exec, file or api
        #[arg(value_name = "TYPE")]
        kind: String,
        action: String,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long)]
        tokens: Option<u64>,
        /// success, error or pending
        #[arg(long, default_value = "success")]
        status: String,
    },
}

pub fn run(root: &Path, subcmd: ActivitySubcommand, json: bool) -> anyhow::Result<()> {
    let log = ActivityLog::open(root);
    match subcmd {
        ActivitySubcommand::List { kind, limit } => list(&log, kind.as_deref(), limit, json),
        ActivitySubcommand::Log {
            kind,
            action,
            details,
            tokens,
            status,
        } => {
            let id = log.log(NewActivity {
                kind: kind.parse::<ActivityType>()?,
                action,
                details,
                tokens,
                status: status.parse::<ActivityStatus>()?,
            })?;
            if json {
                print_json(&serde_json::json!({ "id": id }))?;
            } else {
                println!("Logged activity {id}");
            }
            Ok(())
        }
    }
}

fn list(log: &ActivityLog, kind: Option<&str>, limit: usize, json: bool) -> anyhow::Result<()> {
    let activities = match kind {
        Some(k) => log.list_by_type(k.parse::<ActivityType>()?, Some(limit))?,
        None => log.list(Some(limit))?,
    };
    if json {
        return print_json(&serde_json::json!({ "activities": activities }));
    }
    if activities.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }
    let rows = activities
        .iter()
        .map(|a| {
            let when = Local
                .timestamp_millis_opt(a.timestamp)
                .single()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            vec![
                when,
                a.kind.to_string(),
                a.status.to_string(),
                truncate(&a.action, 30),
                a.tokens.map(|t| t.to_string()).unwrap_or_default(),
                truncate(&a.details, 50),
            ]
        })
        .collect();
    print_table(&["TIME", "TYPE", "STATUS", "ACTION", "TOKENS", "DETAILS"], rows);
    Ok(())
}
