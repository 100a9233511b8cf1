//! Remote sessions over ssh
//!
//! A [`Session`] targets one `user@host` pair and accumulates a command
//! prefix: an optional working directory and an optional virtualenv
//! activation. Each logical step becomes exactly one ssh invocation carrying
//! a single fully-qualified shell string, so there is no connection state to
//! leak between steps. File upload goes through scp on the same target.

use crate::error::CommandError;
use crate::exec::{self, CommandLine, Runner};
use crate::tools;

pub struct Session<'a, R> {
    runner: &'a R,
    target: String,
    cwd: Option<String>,
    activation: Option<String>,
}

impl<'a, R: Runner> Session<'a, R> {
    pub fn new(runner: &'a R, host: &str, user: &str) -> Self {
        Self {
            runner,
            target: format!("{}@{}", user, host),
            cwd: None,
            activation: None,
        }
    }

    /// Scope subsequent commands to a remote working directory.
    pub fn cd(mut self, dir: &str) -> Self {
        self.cwd = Some(dir.to_string());
        self
    }

    /// Activate a virtualenv before each command.
    pub fn activate(mut self, virtualenv: &str) -> Self {
        self.activation = Some(format!("source {}/bin/activate", virtualenv));
        self
    }

    /// Compose the shell string actually sent to the remote host.
    fn wrapped(&self, command: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(ref cwd) = self.cwd {
            parts.push(format!("cd {}", cwd));
        }
        if let Some(ref activation) = self.activation {
            parts.push(activation.clone());
        }
        parts.push(command.to_string());
        parts.join(" && ")
    }

    fn ssh(&self, command: &str) -> CommandLine {
        CommandLine::new(
            tools::resolve(tools::SSH),
            [
                "-o".to_string(),
                "BatchMode=yes".to_string(),
                self.target.clone(),
                self.wrapped(command),
            ],
        )
    }

    /// Run a command remotely and capture its stdout, trimmed of the
    /// trailing newline. Aborts on a non-zero exit.
    pub fn run(&self, command: &str) -> Result<String, CommandError> {
        exec::capture(self.runner, &self.ssh(command))
    }

    /// Run a command remotely with output streamed to the operator.
    pub fn stream(&self, command: &str) -> Result<(), CommandError> {
        exec::run(self.runner, &self.ssh(command))
    }

    /// Upload a local file to a path on the session's host.
    pub fn put(&self, local: &str, remote: &str) -> Result<(), CommandError> {
        let cmd = CommandLine::new(
            tools::resolve(tools::SCP),
            [
                local.to_string(),
                format!("{}:{}", self.target, remote),
            ],
        );
        exec::run(self.runner, &cmd)
    }

    /// `user@host` for tools that address the remote side themselves (rsync).
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Quote a value for inclusion in a remote shell string.
/// Plain identifier-ish values pass through untouched.
pub fn sh_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::FakeRunner;

    #[test]
    fn test_wrapped_composes_cd_then_activation() {
        let runner = FakeRunner::new();
        let session = Session::new(&runner, "prod.example.org", "app")
            .cd("/srv/site")
            .activate("/srv/venv");
        assert_eq!(
            session.wrapped("./manage.py migrate"),
            "cd /srv/site && source /srv/venv/bin/activate && ./manage.py migrate"
        );
    }

    #[test]
    fn test_bare_session_passes_command_through() {
        let runner = FakeRunner::new();
        let session = Session::new(&runner, "prod.example.org", "root");
        assert_eq!(session.wrapped("systemctl restart gunicorn.service"),
                   "systemctl restart gunicorn.service");
    }

    #[test]
    fn test_run_issues_one_ssh_invocation() {
        let runner = FakeRunner::new().respond("rev-parse", "abc1234\n");
        let session = Session::new(&runner, "prod.example.org", "admin").cd("/srv/repo");
        let out = session.run("git rev-parse --short HEAD").unwrap();
        assert_eq!(out, "abc1234");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("ssh -o BatchMode=yes admin@prod.example.org"));
        assert!(calls[0].contains("cd /srv/repo && git rev-parse --short HEAD"));
    }

    #[test]
    fn test_put_uses_scp_target() {
        let runner = FakeRunner::new();
        let session = Session::new(&runner, "prod.example.org", "app");
        session.put("db.sqlite3", "/srv/stage/db.sqlite3").unwrap();
        assert!(runner.issued("scp db.sqlite3 app@prod.example.org:/srv/stage/db.sqlite3"));
    }

    #[test]
    fn test_sh_quote() {
        assert_eq!(sh_quote("DEBUG"), "DEBUG");
        assert_eq!(sh_quote("https://example.org/x"), "https://example.org/x");
        assert_eq!(sh_quote("two words"), "'two words'");
        assert_eq!(sh_quote("it's"), r"'it'\''s'");
    }
}
