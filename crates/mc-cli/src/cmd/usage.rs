use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::Local;
use clap::Subcommand;
use mc_core::config::Config;
use mc_core::ledger::{Billable, Ledger};
use std::path::Path;

#[derive(Subcommand)]
pub enum UsageSubcommand {
    /// Token totals parsed from the tokentap prompt logs
    Tokens {
        /// Also list the most recent requests
        #[arg(long)]
        recent: bool,
    },
    /// API spend per service from the cost ledger
    Ledger {
        /// Number of days to include, ending today (1-365)
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,
    },
    /// Record a billable API call in the ledger
    Log {
        /// openai, fal-image, fal-video, elevenlabs, exa, browser-use,
        /// gemini-image, heygen, runway, suno
        service: String,
        #[arg(long)]
        model: Option<String>,
        /// Tokens, characters or seconds depending on the service
        #[arg(long, default_value_t = 0)]
        quantity: u64,
    },
}

pub fn run(root: &Path, subcmd: UsageSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        UsageSubcommand::Tokens { recent } => tokens(root, &config, recent, json),
        UsageSubcommand::Ledger { days } => ledger(root, &config, days, json),
        UsageSubcommand::Log {
            service,
            model,
            quantity,
        } => log(root, &config, &service, model.as_deref(), quantity, json),
    }
}

fn tokens(root: &Path, config: &Config, recent: bool, json: bool) -> anyhow::Result<()> {
    let dir = config.prompts_dir(root)?;
    let history = mc_core::tokentap::history(&dir, config.usage.parse_options());
    if json {
        return print_json(&history);
    }
    if let Some(err) = &history.error {
        anyhow::bail!("cannot read prompt logs in {}: {err}", history.prompts_dir);
    }

    let s = &history.summary;
    println!(
        "{} tokens across {} requests on {} days ({})",
        s.total_tokens, s.total_requests, s.active_days, history.prompts_dir
    );
    if let (Some(first), Some(last)) = (&s.first_seen_iso, &s.last_seen_iso) {
        println!("First seen {first}, last seen {last}");
    }
    if !s.providers.is_empty() {
        println!();
        let rows = s
            .providers
            .iter()
            .map(|p| vec![p.provider.clone(), p.tokens.to_string(), p.requests.to_string()])
            .collect();
        print_table(&["PROVIDER", "TOKENS", "REQUESTS"], rows);
    }
    if recent && !s.recent.is_empty() {
        println!();
        let rows = s
            .recent
            .iter()
            .map(|e| {
                vec![
                    e.timestamp_iso.clone(),
                    e.provider.clone(),
                    e.model.clone(),
                    e.tokens.to_string(),
                    truncate(&e.prompt_preview, 60),
                ]
            })
            .collect();
        print_table(&["TIME", "PROVIDER", "MODEL", "TOKENS", "PROMPT"], rows);
    }
    Ok(())
}

fn ledger(root: &Path, config: &Config, days: u32, json: bool) -> anyhow::Result<()> {
    let ledger = Ledger::new(config.ledger_dir(root)?);
    let today = Local::now().date_naive();
    let services = ledger.service_summary(today, days)?;
    let today_log = ledger.daily_summary(today)?;

    if json {
        return print_json(&serde_json::json!({
            "days": days,
            "services": services,
            "today": today_log,
        }));
    }
    if services.is_empty() {
        println!("No API usage recorded in the last {days} days.");
        return Ok(());
    }
    let total: f64 = services.values().map(|s| s.total_cost).sum();
    let rows = services
        .iter()
        .map(|(name, s)| {
            vec![
                name.clone(),
                s.total_calls.to_string(),
                format!("${:.4}", s.total_cost),
            ]
        })
        .collect();
    print_table(&["SERVICE", "CALLS", "COST"], rows);
    println!();
    println!("Total ${total:.4} over {days} days; today ${:.4}", today_log.daily_total);
    Ok(())
}

fn log(
    root: &Path,
    config: &Config,
    service: &str,
    model: Option<&str>,
    quantity: u64,
    json: bool,
) -> anyhow::Result<()> {
    let billable = Billable::parse(service, model, quantity)?;
    let entry = Ledger::new(config.ledger_dir(root)?)
        .record(&billable)
        .context("failed to write ledger")?;
    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Logged {} {} (${:.4})",
            entry.service, entry.operation, entry.cost_usd
        );
    }
    Ok(())
}
