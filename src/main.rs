use std::path::Path;

use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod error;
mod exec;
mod remote;
mod tasks;
mod tools;
mod ui;

use cli::{Cli, Commands, ConfigAction};
use config::{ConfigEnv, DeployEnv, GetdataEnv, Settings, StageEnv};
use exec::SystemRunner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let settings = Settings::load(Path::new(&cli.env_file))?;
    let runner = SystemRunner;

    match cli.command {
        Commands::Deploy { skip_dev_push } => {
            let env = DeployEnv::from_settings(&settings)?;
            tasks::deploy::execute(&env, &runner, skip_dev_push).await?;
        }
        Commands::Config { action } => {
            let env = ConfigEnv::from_settings(&settings)?;
            let action = action.unwrap_or(ConfigAction::List);
            tasks::config::execute(&env, &runner, &action).await?;
        }
        Commands::Getdata { force } => {
            let env = GetdataEnv::from_settings(&settings)?;
            tasks::getdata::execute(&env, &runner, force).await?;
        }
        Commands::Stage { push_local_db } => {
            let env = StageEnv::from_settings(&settings)?;
            tasks::stage::execute(&env, &runner, push_local_db).await?;
        }
    }

    Ok(())
}
