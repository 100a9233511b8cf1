//! Remote configuration management
//!
//! Reads and writes the application's `.env` on the production host through
//! the `dotenv` CLI that ships with the application's virtualenv. Argument
//! validation happens at the CLI boundary; by the time this task runs, the
//! action carries everything it needs.

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::ConfigEnv;
use crate::exec::Runner;
use crate::remote::{sh_quote, Session};

pub async fn execute(env: &ConfigEnv, runner: &impl Runner, action: &ConfigAction) -> Result<()> {
    let session = Session::new(runner, &env.server, &env.user)
        .cd(&env.prod_dir)
        .activate(&env.virtualenv);

    let output = session
        .run(&dotenv_command(action))
        .context("Remote configuration command failed")?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Build the `dotenv` invocation for an action. Shared with getdata, which
/// reads the remote configuration the same way.
pub(crate) fn dotenv_command(action: &ConfigAction) -> String {
    match action {
        ConfigAction::Set { key, value } => {
            format!("dotenv -f .env set {} {}", sh_quote(key), sh_quote(value))
        }
        ConfigAction::Get { key } => format!("dotenv -f .env get {}", sh_quote(key)),
        ConfigAction::Unset { key } => format!("dotenv -f .env unset {}", sh_quote(key)),
        ConfigAction::List => "dotenv -f .env list".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::FakeRunner;

    fn env() -> ConfigEnv {
        ConfigEnv {
            server: "prod.example.org".into(),
            user: "app".into(),
            prod_dir: "/srv/site".into(),
            virtualenv: "/srv/venv".into(),
        }
    }

    #[test]
    fn test_dotenv_command_per_action() {
        assert_eq!(
            dotenv_command(&ConfigAction::Set {
                key: "DEBUG".into(),
                value: "false".into()
            }),
            "dotenv -f .env set DEBUG false"
        );
        assert_eq!(
            dotenv_command(&ConfigAction::Get { key: "DEBUG".into() }),
            "dotenv -f .env get DEBUG"
        );
        assert_eq!(
            dotenv_command(&ConfigAction::Unset { key: "DEBUG".into() }),
            "dotenv -f .env unset DEBUG"
        );
        assert_eq!(dotenv_command(&ConfigAction::List), "dotenv -f .env list");
    }

    #[test]
    fn test_dotenv_command_quotes_values_with_spaces() {
        let cmd = dotenv_command(&ConfigAction::Set {
            key: "SITE_NAME".into(),
            value: "My Site".into(),
        });
        assert_eq!(cmd, "dotenv -f .env set SITE_NAME 'My Site'");
    }

    #[test]
    fn test_execute_runs_inside_activated_prod_dir() {
        let runner = FakeRunner::new();
        tokio_test::block_on(execute(
            &env(),
            &runner,
            &ConfigAction::Get { key: "DEBUG".into() },
        ))
        .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("app@prod.example.org"));
        assert!(calls[0].contains(
            "cd /srv/site && source /srv/venv/bin/activate && dotenv -f .env get DEBUG"
        ));
    }
}
