mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    activity::ActivitySubcommand, board::BoardSubcommand, config::ConfigSubcommand,
    cron::CronSubcommand, docs::DocsSubcommand, usage::UsageSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mc",
    about = "Mission control: activity feed, cron jobs, usage stats, documents and project board",
    version,
    propagate_version = true
)]
struct Cli {
    /// Dashboard root (default: auto-detect from .mission-control/ or .git/)
    #[arg(long, global = true, env = "MC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .mission-control/ with a default config and the documents folder
    Init,

    /// Start the HTTP API server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
        /// Open a browser once the server is up
        #[arg(long)]
        open: bool,
    },

    /// Browse and edit the document vault
    Docs {
        #[command(subcommand)]
        subcommand: DocsSubcommand,
    },

    /// Token usage from prompt logs and the API cost ledger
    Usage {
        #[command(subcommand)]
        subcommand: UsageSubcommand,
    },

    /// Scheduled jobs from the gateway or the local cron store
    Cron {
        #[command(subcommand)]
        subcommand: CronSubcommand,
    },

    /// Read and append to the activity feed
    Activity {
        #[command(subcommand)]
        subcommand: ActivitySubcommand,
    },

    /// Search memory files and documents
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Dashboard configuration and agent config files
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Project kanban board
    Board {
        #[command(subcommand)]
        subcommand: BoardSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open),
        Commands::Docs { subcommand } => cmd::docs::run(&root, subcommand, cli.json),
        Commands::Usage { subcommand } => cmd::usage::run(&root, subcommand, cli.json),
        Commands::Cron { subcommand } => cmd::cron::run(&root, subcommand, cli.json),
        Commands::Activity { subcommand } => cmd::activity::run(&root, subcommand, cli.json),
        Commands::Search { query } => cmd::search::run(&root, &query.join(" "), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Board { subcommand } => cmd::board::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
