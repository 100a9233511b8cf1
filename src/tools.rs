//! Runtime tool path resolution
//!
//! Every external binary (ssh, rsync, psql, ...) is invoked by name and
//! resolved through PATH. A `{TOOL}_BIN` environment variable overrides the
//! path for a given tool (e.g. `RSYNC_BIN=/opt/homebrew/bin/rsync`), which
//! keeps the invocation explicit on machines where the packaged tool is too
//! old or lives outside PATH.

use std::env;

pub const SSH: &str = "ssh";
pub const SCP: &str = "scp";
pub const RSYNC: &str = "rsync";
pub const GIT: &str = "git";
pub const DROPDB: &str = "dropdb";
pub const CREATEDB: &str = "createdb";
pub const PSQL: &str = "psql";
pub const SH: &str = "sh";

/// Resolve the path to an external tool.
///
/// Checks the `{TOOL}_BIN` environment variable (uppercase tool name plus
/// `_BIN`), falling back to the bare tool name for PATH lookup.
pub fn resolve(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase().replace('-', "_"));
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}
