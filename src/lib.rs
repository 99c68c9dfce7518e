pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod keystore;
pub mod models;
pub mod registry;
pub mod ssh_config;
pub mod sync;
pub mod utils;
