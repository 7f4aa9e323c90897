use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use mc_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let results = mc_core::search::search(
        &config.memory_root(root)?,
        &config.docs_root(root)?,
        query,
    );

    if json {
        return print_json(&serde_json::json!({ "results": results }));
    }
    if results.is_empty() {
        println!("No results for '{query}'.");
        return Ok(());
    }
    let rows = results
        .iter()
        .map(|r| {
            vec![
                format!("{:.1}", r.score),
                r.title.clone(),
                r.path.clone(),
                truncate(&r.snippet, 70),
            ]
        })
        .collect();
    print_table(&["SCORE", "TITLE", "PATH", "SNIPPET"], rows);
    Ok(())
}
