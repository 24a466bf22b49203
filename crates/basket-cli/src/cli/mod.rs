pub mod client;
pub mod command;
pub mod config;
pub mod render;

pub use client::{execute, run_command, run_config, ConfigAction, Options};
pub use command::CliCommand;
pub use config::CliConfig;
