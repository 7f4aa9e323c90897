pub mod activity;
pub mod config;
pub mod cron;
pub mod docs;
pub mod events;
pub mod health;
pub mod projects;
pub mod search;
pub mod usage;
