pub mod activity;
pub mod board;
pub mod config;
pub mod cron;
pub mod docs;
pub mod init;
pub mod search;
pub mod serve;
pub mod usage;
