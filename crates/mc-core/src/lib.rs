pub mod activity;
pub mod board;
pub mod config;
pub mod config_files;
pub mod cron;
pub mod docs;
pub mod error;
pub mod frontmatter;
pub mod gateway;
pub mod io;
pub mod ledger;
pub mod palette;
pub mod paths;
pub mod search;
pub mod tokentap;

pub use error::{McError, Result};
