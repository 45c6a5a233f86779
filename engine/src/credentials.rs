//! Resolution of the login name and secret for a remote endpoint.
//!
//! Precedence: explicit password, then explicit key file, then the first
//! conventional private key found under `~/.ssh`. The login name comes from
//! the options, then the `user@` part of the location, then the local user.

use log::debug;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::model::SyncOptions;

/// Key files probed under `~/.ssh`, in order.
pub const DEFAULT_KEY_NAMES: [&str; 3] = ["id_rsa", "id_ed25519", "id_ecdsa"];

/// How the session authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    Password(String),
    KeyFile(PathBuf),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Password(_) => write!(f, "Password(***)"),
            Secret::KeyFile(path) => write!(f, "KeyFile({})", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: Secret,
}

impl Credentials {
    /// Resolve credentials for `host` from options, location and environment.
    pub fn resolve(
        options: &SyncOptions,
        location_user: Option<&str>,
        host: &str,
    ) -> Result<Self, SyncError> {
        let home = home::home_dir();
        Self::resolve_with(
            options,
            location_user,
            host,
            home.as_deref(),
            local_login_name(),
        )
    }

    pub(crate) fn resolve_with(
        options: &SyncOptions,
        location_user: Option<&str>,
        host: &str,
        home: Option<&Path>,
        login: Option<String>,
    ) -> Result<Self, SyncError> {
        let username = options
            .username
            .clone()
            .or_else(|| location_user.map(str::to_string))
            .or(login)
            .ok_or_else(|| SyncError::NoCredential {
                host: host.to_string(),
                reason: "no username provided or inferred".to_string(),
            })?;

        if let Some(password) = &options.password {
            return Ok(Credentials {
                username,
                secret: Secret::Password(password.clone()),
            });
        }

        if let Some(key_file) = &options.key_file {
            if !key_file.is_file() {
                return Err(SyncError::NoCredential {
                    host: host.to_string(),
                    reason: format!("key file {} does not exist", key_file.display()),
                });
            }
            return Ok(Credentials {
                username,
                secret: Secret::KeyFile(key_file.clone()),
            });
        }

        match home.and_then(probe_default_key) {
            Some(key_file) => {
                debug!("found local ssh key {}", key_file.display());
                Ok(Credentials {
                    username,
                    secret: Secret::KeyFile(key_file),
                })
            }
            None => Err(SyncError::NoCredential {
                host: host.to_string(),
                reason: "either a password or an ssh key is required".to_string(),
            }),
        }
    }
}

/// First conventional private key present under `home/.ssh`.
pub fn probe_default_key(home: &Path) -> Option<PathBuf> {
    let ssh_dir = home.join(".ssh");
    DEFAULT_KEY_NAMES
        .iter()
        .map(|name| ssh_dir.join(name))
        .find(|path| path.is_file())
}

fn local_login_name() -> Option<String> {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
}
