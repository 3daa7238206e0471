#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod execute;
pub mod generate;
pub mod guard;
pub mod llm;
pub mod logging;
pub mod models;
pub mod modify;
pub mod schema;
pub mod server;
pub mod services;
pub mod utils;
pub mod validate;

pub use cli::app::{Cli, Command};
