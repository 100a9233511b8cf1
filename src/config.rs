//! Deployment configuration
//!
//! Settings come from a local `.env` file of `KEY=value` lines — the same
//! format the application itself reads, and the same file the `config` task
//! edits on the remote side. A process environment variable with the same
//! name always wins over the file.
//!
//! Tasks never touch [`Settings`] directly: each one converts it into a
//! typed view (`DeployEnv`, `ConfigEnv`, ...) at its boundary, so a missing
//! key is reported by name before any command runs, and a task only requires
//! the keys it actually uses.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;

/// Raw settings parsed from the environment file.
#[derive(Debug, Default, Clone)]
pub struct Settings {
    pub prod_server: Option<String>,
    pub prod_user: Option<String>,
    pub prod_super_user: Option<String>,
    pub remote_prod_dir: Option<String>,
    pub remote_prod_virtualenv: Option<String>,
    pub remote_stage_dir: Option<String>,
    pub remote_stage_virtualenv: Option<String>,
    pub git_repo: Option<String>,
    pub dev_repo_remote: Option<String>,
    pub database: Option<String>,
    pub local_database: Option<String>,
    pub local_database_user: Option<String>,
    pub static_root: Option<String>,
    pub media_root: Option<String>,
}

impl Settings {
    /// Load settings from `path`. A missing file is not an error — every key
    /// may instead come from the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut file_values = Vec::new();

        match fs::read_to_string(path) {
            Ok(content) => {
                for (idx, line) in content.lines().enumerate() {
                    if let Some(pair) = parse_line(line).map_err(|()| ConfigError::Malformed {
                        path: path.display().to_string(),
                        line: idx + 1,
                    })? {
                        file_values.push(pair);
                    }
                }
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!("No environment file at {}", path.display());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        }

        let lookup = |key: &str| -> Option<String> {
            std::env::var(key).ok().or_else(|| {
                file_values
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
            })
        };

        Ok(Self {
            prod_server: lookup("PROD_SERVER"),
            prod_user: lookup("PROD_USER"),
            prod_super_user: lookup("PROD_SUPERUSER"),
            remote_prod_dir: lookup("REMOTE_PROD_DIR"),
            remote_prod_virtualenv: lookup("REMOTE_PROD_VIRTUALENV"),
            remote_stage_dir: lookup("REMOTE_STAGE_DIR"),
            remote_stage_virtualenv: lookup("REMOTE_STAGE_VIRTUALENV"),
            git_repo: lookup("GIT_REPO"),
            dev_repo_remote: lookup("DEV_REPO_REMOTE"),
            database: lookup("DATABASE"),
            local_database: lookup("LOCAL_DATABASE"),
            local_database_user: lookup("LOCAL_DATABASE_USER"),
            static_root: lookup("STATIC_ROOT"),
            media_root: lookup("MEDIA_ROOT"),
        })
    }
}

/// Parse one line of the environment file.
/// Returns `Ok(None)` for blanks and comments, `Err(())` for anything that
/// is not a `KEY=value` pair.
fn parse_line(line: &str) -> Result<Option<(String, String)>, ()> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=').ok_or(())?;
    let key = key.trim();
    if key.is_empty() {
        return Err(());
    }

    Ok(Some((key.to_string(), unquote(value.trim()).to_string())))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn require(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value.clone().ok_or(ConfigError::MissingKey { key })
}

/// Everything the deploy task needs.
#[derive(Debug, Clone)]
pub struct DeployEnv {
    pub server: String,
    pub user: String,
    pub super_user: String,
    /// Repository directory on the production host (commit hash source).
    pub repo_dir: String,
    pub prod_dir: String,
    pub virtualenv: String,
    pub database: String,
    /// Secondary development remote; absent means the push is skipped.
    pub dev_repo_remote: Option<String>,
}

impl DeployEnv {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            server: require(&s.prod_server, "PROD_SERVER")?,
            user: require(&s.prod_user, "PROD_USER")?,
            super_user: require(&s.prod_super_user, "PROD_SUPERUSER")?,
            repo_dir: require(&s.git_repo, "GIT_REPO")?,
            prod_dir: require(&s.remote_prod_dir, "REMOTE_PROD_DIR")?,
            virtualenv: require(&s.remote_prod_virtualenv, "REMOTE_PROD_VIRTUALENV")?,
            database: require(&s.database, "DATABASE")?,
            dev_repo_remote: s.dev_repo_remote.clone(),
        })
    }
}

/// Everything the config task needs.
#[derive(Debug, Clone)]
pub struct ConfigEnv {
    pub server: String,
    pub user: String,
    pub prod_dir: String,
    pub virtualenv: String,
}

impl ConfigEnv {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            server: require(&s.prod_server, "PROD_SERVER")?,
            user: require(&s.prod_user, "PROD_USER")?,
            prod_dir: require(&s.remote_prod_dir, "REMOTE_PROD_DIR")?,
            virtualenv: require(&s.remote_prod_virtualenv, "REMOTE_PROD_VIRTUALENV")?,
        })
    }
}

/// Everything the getdata task needs.
#[derive(Debug, Clone)]
pub struct GetdataEnv {
    pub server: String,
    pub user: String,
    pub prod_dir: String,
    pub virtualenv: String,
    pub local_database: String,
    pub local_database_user: String,
    pub static_root: String,
    pub media_root: String,
}

impl GetdataEnv {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            server: require(&s.prod_server, "PROD_SERVER")?,
            user: require(&s.prod_user, "PROD_USER")?,
            prod_dir: require(&s.remote_prod_dir, "REMOTE_PROD_DIR")?,
            virtualenv: require(&s.remote_prod_virtualenv, "REMOTE_PROD_VIRTUALENV")?,
            local_database: require(&s.local_database, "LOCAL_DATABASE")?,
            local_database_user: require(&s.local_database_user, "LOCAL_DATABASE_USER")?,
            static_root: require(&s.static_root, "STATIC_ROOT")?,
            media_root: require(&s.media_root, "MEDIA_ROOT")?,
        })
    }
}

/// Everything the stage task needs.
#[derive(Debug, Clone)]
pub struct StageEnv {
    pub server: String,
    pub user: String,
    pub stage_dir: String,
    pub virtualenv: String,
}

impl StageEnv {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            server: require(&s.prod_server, "PROD_SERVER")?,
            user: require(&s.prod_user, "PROD_USER")?,
            stage_dir: require(&s.remote_stage_dir, "REMOTE_STAGE_DIR")?,
            virtualenv: require(&s.remote_stage_virtualenv, "REMOTE_STAGE_VIRTUALENV")?,
        })
    }
}
