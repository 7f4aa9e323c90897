use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use mc_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Summarize the agent config files (SOUL.md, MEMORY.md, ...)
    Files {
        /// Print the full contents of one file
        #[arg(long)]
        name: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => show(&config, json),
        ConfigSubcommand::Validate => validate(root, &config, json),
        ConfigSubcommand::Files { name } => files(root, &config, name.as_deref(), json),
    }
}

fn show(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, config: &Config, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate(root);

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// files
// ---------------------------------------------------------------------------

fn files(root: &Path, config: &Config, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let dir = config.config_files_dir(root)?;
    let files = mc_core::config_files::read_all(&dir);

    if let Some(name) = name {
        let file = files
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("'{name}' is not an agent config file"))?;
        if json {
            return print_json(file);
        }
        print!("{}", file.content);
        return Ok(());
    }

    if json {
        return print_json(&serde_json::json!({ "files": files }));
    }
    let rows = files
        .iter()
        .map(|f| {
            vec![
                f.name.clone(),
                f.lines.to_string(),
                f.words.to_string(),
                f.description.clone(),
            ]
        })
        .collect();
    print_table(&["FILE", "LINES", "WORDS", "DESCRIPTION"], rows);
    Ok(())
}
