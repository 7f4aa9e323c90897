use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use mc_core::config::Config;
use mc_core::cron;
use mc_core::gateway::GatewayClient;
use serde_json::Value;
use std::path::Path;

#[derive(Subcommand)]
pub enum CronSubcommand {
    /// List jobs known to the gateway, grouped by station
    List {
        /// Read the local cron store instead of asking the gateway
        #[arg(long)]
        store: bool,
    },
    /// Show stored jobs on a Sunday-to-Saturday calendar
    Calendar {
        /// Any day of the week to show (YYYY-MM-DD, default today)
        #[arg(long)]
        week: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: CronSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        CronSubcommand::List { store: true } => list_store(root, &config, json),
        CronSubcommand::List { store: false } => list_gateway(&config, json),
        CronSubcommand::Calendar { week } => calendar(root, &config, week.as_deref(), json),
    }
}

fn format_ms(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list_gateway(config: &Config, json: bool) -> anyhow::Result<()> {
    let result = GatewayClient::new(&config.gateway)?
        .cron_list()
        .context("failed to list cron jobs")?;
    if json {
        return print_json(&result);
    }

    let jobs = cron::parse_gateway_jobs(&result);
    let overview = cron::overview(&jobs);
    let status = if overview.live { "Live" } else { "Idle" };
    let next = overview
        .next_run_at_ms
        .map(format_ms)
        .unwrap_or_else(|| "none".to_string());
    println!(
        "{status}: {} jobs, {} enabled, next run {next}",
        overview.total, overview.enabled
    );

    for column in overview.columns.iter().filter(|c| !c.jobs.is_empty()) {
        println!();
        println!("{} ({})", column.title, column.jobs.len());
        let rows = column
            .jobs
            .iter()
            .map(|j| {
                vec![
                    j.id.clone(),
                    truncate(j.name.as_deref().unwrap_or("Untitled job"), 40),
                    j.schedule_label(),
                    j.next_run()
                        .map(|dt: DateTime<Utc>| format_ms(dt.timestamp_millis()))
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "SCHEDULE", "NEXT RUN"], rows);
    }
    Ok(())
}

fn list_store(root: &Path, config: &Config, json: bool) -> anyhow::Result<()> {
    let jobs = cron::read_cron_store(&config.cron_store_path(root)?);
    if json {
        return print_json(&serde_json::json!({ "jobs": jobs }));
    }
    if jobs.is_empty() {
        println!("No stored cron jobs.");
        return Ok(());
    }
    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                j.id.clone(),
                display_value(&j.schedule),
                truncate(&display_value(&j.text), 50),
                j.next_run_ms().map(format_ms).unwrap_or_else(|| "-".to_string()),
                if j.enabled { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "SCHEDULE", "TASK", "NEXT RUN", "ENABLED"], rows);
    Ok(())
}

fn calendar(root: &Path, config: &Config, week: Option<&str>, json: bool) -> anyhow::Result<()> {
    let anchor = match week {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid week date '{raw}'"))?,
        None => Local::now().date_naive(),
    };
    let jobs = cron::read_cron_store(&config.cron_store_path(root)?);
    let days = cron::calendar_week(&jobs, anchor)?;
    if json {
        return print_json(&serde_json::json!({ "days": days }));
    }
    for day in &days {
        println!("{}", day.date.format("%a %Y-%m-%d"));
        if day.jobs.is_empty() {
            println!("  -");
        }
        for job in &day.jobs {
            let time = job
                .next_run_ms()
                .and_then(|ms| Local.timestamp_millis_opt(ms).single())
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_default();
            println!("  {time}  {}", truncate(&display_value(&job.text), 60));
        }
    }
    Ok(())
}
