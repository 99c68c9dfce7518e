// src/cli/mod.rs
pub mod info;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ssh-key-manager")]
#[command(about = "Manage per-host SSH identities and keep ssh_config in sync", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: <config dir>/ssh-key-manager/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory holding keys, keys.json and config
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a key pair, register it and add a Host block
    Create {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short = 'H', long)]
        host: Option<String>,

        #[arg(short, long)]
        alias: Option<String>,
    },

    /// Delete an identity by alias
    Delete { alias: String },

    /// Delete every key, the config document and all records
    DeleteAll {
        #[arg(short, long)]
        yes: bool,
    },

    /// List registered identities
    List {
        #[arg(short, long)]
        fingerprints: bool,
    },

    /// Copy an identity and the config document into the SSH directory
    Deploy { alias: String },

    /// Print the managed ssh_config document
    ShowConfig,

    /// Print keys.json
    ShowRegistry,

    /// Cross-check keys, registry and config document
    Verify {
        #[arg(short, long)]
        repair: bool,

        #[arg(short, long)]
        yes: bool,
    },

    /// Write the default settings file
    InitConfig {
        #[arg(short, long)]
        force: bool,
    },

    /// Show version and resolved paths
    Info,

    /// Generate shell completion script
    Completion { shell: Option<String> },
}
