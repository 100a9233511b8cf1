//! Staging deploy
//!
//! Pushes the dev branch and refreshes the staging checkout. Two mutually
//! exclusive update strategies: run the migrations remotely, or overwrite
//! the staging SQLite file with the local one (useful when the local data
//! itself is what needs to be inspected on staging).

use anyhow::{Context, Result};
use tracing::info;

use crate::config::StageEnv;
use crate::exec::{self, CommandLine, Runner};
use crate::remote::Session;
use crate::tools;
use crate::ui;

pub async fn execute(env: &StageEnv, runner: &impl Runner, push_local_db: bool) -> Result<()> {
    ui::banner("Deploy to staging");

    info!("Pushing to staging server");
    exec::run(
        runner,
        &CommandLine::new(tools::resolve(tools::GIT), ["push", "origin", "dev"]),
    )
    .context("Failed to push the dev branch")?;

    let app = Session::new(runner, &env.server, &env.user)
        .cd(&env.stage_dir)
        .activate(&env.virtualenv);

    info!("Installing requirements");
    app.stream("pip install -r requirements.txt")?;
    app.stream("pip install -r requirements-local.txt")?;

    if push_local_db {
        info!("Uploading the local database file");
        Session::new(runner, &env.server, &env.user)
            .put("db.sqlite3", &format!("{}/db.sqlite3", env.stage_dir))
            .context("Failed to upload db.sqlite3")?;
    } else {
        info!("Migrating database schema");
        app.stream("./manage.py migrate")?;

        info!("Collecting static files");
        app.stream("./manage.py collectstatic --noinput")?;
    }

    ui::success("Staging deploy complete");
    Ok(())
}
