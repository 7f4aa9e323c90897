use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use mc_core::config::Config;
use mc_core::docs::{self, DocTreeNode, NodeKind, Vault};
use mc_core::frontmatter::DocFrontmatter;
use mc_core::palette;
use std::io::Read;
use std::path::Path;

#[derive(Subcommand)]
pub enum DocsSubcommand {
    /// Print the document tree
    Tree,
    /// Print one document
    Show {
        path: String,
        /// Render the body to HTML instead of printing markdown
        #[arg(long)]
        html: bool,
    },
    /// Create or overwrite a document
    New {
        path: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Body text; `-` reads from stdin
        #[arg(long)]
        content: Option<String>,
    },
    /// Filter documents like the command palette; `--open` prints the first match
    Palette {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        open: bool,
    },
}

pub fn run(root: &Path, subcmd: DocsSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let vault = Vault::new(config.docs_root(root)?);
    match subcmd {
        DocsSubcommand::Tree => tree(&vault, json),
        DocsSubcommand::Show { path, html } => show(&vault, &path, html, json),
        DocsSubcommand::New {
            path,
            title,
            date,
            tags,
            content,
        } => new(&vault, &path, title, date, tags.as_deref(), content, json),
        DocsSubcommand::Palette { query, open } => palette(&vault, &query, open, json),
    }
}

fn tree(vault: &Vault, json: bool) -> anyhow::Result<()> {
    let tree = vault.tree().context("failed to read document tree")?;
    if json {
        return print_json(&serde_json::json!({ "tree": tree }));
    }
    if tree.is_empty() {
        println!("No documents in {}.", mc_core::paths::display_path(vault.root()));
        return Ok(());
    }
    print_nodes(&tree, 0);
    Ok(())
}

fn print_nodes(nodes: &[DocTreeNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match node.kind {
            NodeKind::Dir => {
                println!("{indent}{}/", node.name);
                print_nodes(node.children.as_deref().unwrap_or_default(), depth + 1);
            }
            NodeKind::File => println!("{indent}{}", node.name),
        }
    }
}

fn show(vault: &Vault, path: &str, html: bool, json: bool) -> anyhow::Result<()> {
    let doc = vault.read(path)?;
    if json {
        return print_json(&serde_json::json!({
            "path": doc.path,
            "frontmatter": doc.frontmatter,
            "content": doc.content,
            "html": docs::render_html(&doc.content),
        }));
    }
    if html {
        print!("{}", docs::render_html(&doc.content));
        return Ok(());
    }
    let fm = &doc.frontmatter;
    if let Some(title) = &fm.title {
        println!("Title: {title}");
    }
    if let Some(date) = &fm.date {
        println!("Date:  {date}");
    }
    if let Some(tags) = fm.tags.as_ref().filter(|t| !t.is_empty()) {
        println!("Tags:  {}", tags.join(", "));
    }
    if !fm.is_empty() {
        println!();
    }
    print!("{}", doc.content);
    Ok(())
}

fn new(
    vault: &Vault,
    path: &str,
    title: Option<String>,
    date: Option<String>,
    tags: Option<&str>,
    content: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let body = match content.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read content from stdin")?;
            buf
        }
        Some(text) => text.to_string(),
        None => String::new(),
    };
    let frontmatter = DocFrontmatter {
        title,
        date,
        tags: tags.map(mc_core::board::parse_tags),
        ..DocFrontmatter::default()
    };
    let normalized = vault.write(path, Some(&body), Some(&frontmatter))?;

    if json {
        print_json(&serde_json::json!({ "path": normalized }))?;
    } else {
        println!("Wrote {normalized}");
    }
    Ok(())
}

fn palette(vault: &Vault, query: &str, open: bool, json: bool) -> anyhow::Result<()> {
    let items = palette::items(&vault.tree()?);

    if open {
        let Some(item) = palette::first_match(&items, query) else {
            anyhow::bail!("no document matches '{query}'");
        };
        return show(vault, &item.path, false, json);
    }

    let matches = palette::filter(&items, query);
    if json {
        return print_json(&serde_json::json!({ "items": matches }));
    }
    if matches.is_empty() {
        println!("No documents match.");
        return Ok(());
    }
    let rows = matches
        .iter()
        .map(|i| vec![i.name.clone(), i.path.clone()])
        .collect();
    print_table(&["NAME", "PATH"], rows);
    Ok(())
}
