use crate::output::print_json;
use anyhow::Context;
use mc_core::config::Config;
use mc_core::docs::Vault;
use mc_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    if !json {
        println!("Initializing mission control in: {}", root.display());
    }

    let mc_dir = paths::mc_dir(root);
    io::ensure_dir(&mc_dir).with_context(|| format!("failed to create {}", mc_dir.display()))?;

    let created_config = Config::default()
        .save_if_missing(root)
        .context("failed to write config.yaml")?;

    let config = Config::load(root).context("failed to load config")?;
    let docs_root = config.docs_root(root)?;
    Vault::new(&docs_root)
        .ensure_root()
        .with_context(|| format!("failed to create {}", docs_root.display()))?;

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "config_created": created_config,
            "docs_root": docs_root,
        }))?;
    } else {
        let verb = if created_config { "created" } else { "exists: " };
        println!("  {verb} {}", paths::CONFIG_FILE);
        println!("  docs:    {}", paths::display_path(&docs_root));
    }
    Ok(())
}
