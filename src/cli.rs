//! CLI definitions for deckhand
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "deckhand",
    version,
    about = "Deployment tasks for the site's production and staging servers",
    long_about = "Runs the deployment recipes for this application over ssh:\npush code, back up and migrate the database, sync static/media trees,\nand restart services. Configuration comes from the local .env file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the local environment file
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the master branch to the production server
    Deploy {
        /// Do not push to the development repo remote first
        #[arg(long)]
        skip_dev_push: bool,
    },

    /// Manage the application configuration on the production server
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Pull the production database and static/media files down to this machine
    Getdata {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Push the dev branch to the staging site
    Stage {
        /// Upload the local SQLite file instead of migrating remotely
        #[arg(long)]
        push_local_db: bool,
    },
}

/// Actions on the remote environment file. Each variant carries exactly the
/// operands it requires, so an incomplete invocation fails at parse time
/// before any connection is made.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Set a variable
    Set { key: String, value: String },

    /// Get a variable
    Get { key: String },

    /// Unset a variable
    Unset { key: String },

    /// List all variables (the default)
    List,
}
