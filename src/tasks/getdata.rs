//! Pull production data down to the local machine
//!
//! The only task that destroys local state: the local database is dropped
//! and recreated from the production dump, and the local static/media trees
//! are mirrored with deletion. Hence the confirmation gate.
//!
//! The remote paths and database credentials are not taken from local
//! settings; they are read from the production `.env` itself, so the pull
//! follows whatever the server is actually configured to use.

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::cli::ConfigAction;
use crate::config::GetdataEnv;
use crate::exec::{self, CommandLine, Runner};
use crate::remote::Session;
use crate::tasks::config::dotenv_command;
use crate::tools;
use crate::ui;

pub async fn execute(env: &GetdataEnv, runner: &impl Runner, force: bool) -> Result<()> {
    ui::banner("Pull production data");

    if !force {
        let prompt = format!(
            "This will overwrite the local database \"{}\" and the local static/media trees. Continue?",
            env.local_database
        );
        if !ui::confirm(&prompt).context("Failed to read confirmation")? {
            info!("Cancelled");
            return Ok(());
        }
    }

    let app = Session::new(runner, &env.server, &env.user)
        .cd(&env.prod_dir)
        .activate(&env.virtualenv);

    info!("Reading remote configuration");
    let remote_static_root = remote_value(&app, "STATIC_ROOT")?;
    let remote_media_root = remote_value(&app, "MEDIA_ROOT")?;
    let remote_database = remote_value(&app, "DATABASE")?;
    let remote_database_user = remote_value(&app, "USERNAME")?;

    info!("Backing up the database");
    let shell = Session::new(runner, &env.server, &env.user).cd(&env.prod_dir);
    let spinner = ui::spinner(&format!("Dumping {}...", remote_database));
    shell
        .run(&format!(
            "pg_dump -U {} {} > {}/data/dump.sql",
            remote_database_user, remote_database, env.prod_dir
        ))
        .context("Remote database dump failed")?;
    spinner.finish_and_clear();

    info!("Getting remote data dump file");
    exec::run(
        runner,
        &CommandLine::new(
            tools::resolve(tools::RSYNC),
            [
                "-vzh".to_string(),
                "--info=progress2".to_string(),
                format!("{}:{}/data/dump.sql", shell.target(), env.prod_dir),
                "data/dump.sql".to_string(),
            ],
        ),
    )
    .context("Failed to fetch the database dump")?;

    info!("Recreating local database");
    exec::run(
        runner,
        &CommandLine::new(tools::resolve(tools::DROPDB), [env.local_database.as_str()]),
    )
    .context("Failed to drop the local database")?;
    exec::run(
        runner,
        &CommandLine::new(tools::resolve(tools::CREATEDB), [env.local_database.as_str()]),
    )
    .context("Failed to create the local database")?;

    // Restores routinely exit non-zero over pre-existing roles and
    // extensions; that is not a reason to stop.
    exec::run_tolerated(
        runner,
        &CommandLine::new(
            tools::resolve(tools::SH),
            [
                "-c".to_string(),
                format!(
                    "{} -U {} {} < data/dump.sql",
                    tools::resolve(tools::PSQL),
                    env.local_database_user,
                    env.local_database
                ),
            ],
        ),
    )?;

    info!("Syncing static and media files");
    exec::run(
        runner,
        &CommandLine::new(
            tools::resolve(tools::RSYNC),
            [
                "-avzh".to_string(),
                "--info=progress2".to_string(),
                "--delete".to_string(),
                format!("{}:{}/", shell.target(), remote_static_root),
                format!("{}/", env.static_root),
            ],
        ),
    )
    .context("Failed to sync the static tree")?;
    exec::run(
        runner,
        &CommandLine::new(
            tools::resolve(tools::RSYNC),
            [
                "-avzh".to_string(),
                "--info=progress2".to_string(),
                "--delete".to_string(),
                "--exclude=applications/*".to_string(),
                format!("{}:{}/", shell.target(), remote_media_root),
                format!("{}/", env.media_root),
            ],
        ),
    )
    .context("Failed to sync the media tree")?;

    ui::success("Production data pulled");
    Ok(())
}

/// Read one value from the production `.env`, answered as a `KEY=value` line.
fn remote_value<R: Runner>(session: &Session<'_, R>, key: &str) -> Result<String> {
    let line = session
        .run(&dotenv_command(&ConfigAction::Get {
            key: key.to_string(),
        }))
        .with_context(|| format!("Failed to read {} from the remote configuration", key))?;

    let (_, value) = line
        .split_once('=')
        .ok_or_else(|| anyhow!("Unexpected dotenv output for {}: {:?}", key, line))?;
    Ok(value.trim().to_string())
}
