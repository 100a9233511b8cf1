//! Production deploy
//!
//! The one recipe with remote state changes at every step: back up the
//! database, push the code, install and migrate, restart the service. Any
//! failing step aborts the rest; there is no rollback, the backup taken up
//! front is the recovery path.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::DeployEnv;
use crate::exec::{self, CommandLine, Runner};
use crate::remote::Session;
use crate::tools;
use crate::ui;

pub async fn execute(env: &DeployEnv, runner: &impl Runner, skip_dev_push: bool) -> Result<()> {
    ui::banner("Deploy to production");

    // The backup filename is stamped with the commit and clock of the
    // production host, not this machine.
    info!("Backing up the database");
    let repo = Session::new(runner, &env.server, &env.super_user).cd(&env.repo_dir);
    let hash = repo
        .run("git rev-parse --short HEAD")
        .context("Failed to resolve the deployed commit")?;
    let date = repo
        .run(r#"date -u "+%Y-%m-%d_%H:%M:%S""#)
        .context("Failed to read the remote clock")?;
    let filename = backup_filename(&date, &hash);

    let admin = Session::new(runner, &env.server, &env.super_user);
    let spinner = ui::spinner(&format!("Dumping {} to {}...", env.database, filename));
    admin
        .run(&format!(
            "sudo su - postgres -c 'pg_dump {} > {}/{}'",
            env.database, env.prod_dir, filename
        ))
        .context("Database backup failed")?;
    spinner.finish_and_clear();

    if !skip_dev_push {
        match env.dev_repo_remote.as_deref() {
            Some(remote) => {
                info!("Pushing to development repo remote: {}", remote);
                exec::run(
                    runner,
                    &CommandLine::new(tools::resolve(tools::GIT), ["push", remote]),
                )
                .context("Failed to push to the development remote")?;
            }
            None => debug!("No development repo remote configured, skipping"),
        }
    }

    info!("Pushing to production server");
    exec::run(
        runner,
        &CommandLine::new(
            tools::resolve(tools::GIT),
            ["push", "--push-option=live", "origin", "master"],
        ),
    )
    .context("Failed to push master to origin")?;

    let app = Session::new(runner, &env.server, &env.user)
        .cd(&env.prod_dir)
        .activate(&env.virtualenv);

    info!("Installing requirements");
    app.stream("pip install -r requirements.txt")?;

    info!("Migrating database schema");
    app.stream("./manage.py migrate")?;

    info!("Collecting static files");
    app.stream("./manage.py collectstatic --noinput")?;

    info!("Creating initial versions for models");
    app.stream("./manage.py createinitialrevisions")?;

    info!("Restarting gunicorn service");
    admin
        .run("systemctl restart gunicorn.service")
        .context("Failed to restart the application service")?;

    ui::success("Deploy complete");
    Ok(())
}

fn backup_filename(date: &str, hash: &str) -> String {
    format!("data/backup/{}-{}.sql", date, hash)
}
