pub mod backfill;
pub mod cli;
pub mod listing;
pub mod load_config;

pub use cli::{run, Cli, Commands};
