//! Parsing of `[user@]host:path` location strings.

use std::fmt;

/// One endpoint of a sync, as typed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Login name from a `user@` prefix
    pub user: Option<String>,

    /// Remote host; `None` for local paths
    pub host: Option<String>,

    /// Filesystem path on the endpoint, unnormalized
    pub path: String,

    /// Whether the path was typed with a trailing separator
    pub trailing_slash: bool,
}

impl Location {
    /// Parse a location string. Never fails: anything that does not look like
    /// `[user@]host:path` is a local path.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, cfg!(windows))
    }

    pub(crate) fn parse_with(raw: &str, drive_letters: bool) -> Self {
        match split_remote(raw, drive_letters) {
            Some((user, host, path)) => {
                // `host:` alone names the login directory
                let path = if path.is_empty() { "." } else { path };
                Location {
                    user: user.map(str::to_string),
                    host: Some(host.to_string()),
                    path: path.to_string(),
                    trailing_slash: path.ends_with('/'),
                }
            }
            None => Location {
                user: None,
                host: None,
                path: raw.to_string(),
                trailing_slash: raw.ends_with(is_separator),
            },
        }
    }

    pub fn is_remote(&self) -> bool {
        self.host.is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.user, &self.host) {
            (Some(user), Some(host)) => write!(f, "{}@{}:{}", user, host, self.path),
            (None, Some(host)) => write!(f, "{}:{}", host, self.path),
            _ => write!(f, "{}", self.path),
        }
    }
}

/// Path separator on the local filesystem (and always `/`).
pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

fn split_remote(raw: &str, drive_letters: bool) -> Option<(Option<&str>, &str, &str)> {
    let (head, path) = raw.split_once(':')?;

    // C:\data or C:/data
    if drive_letters && head.len() == 1 && head.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    // ./odd:name is a local file, as with rsync
    if head.contains(is_separator) {
        return None;
    }

    let (user, host) = match head.split_once('@') {
        Some((user, host)) => (Some(user).filter(|u| !u.is_empty()), host),
        None => (None, head),
    };
    if host.is_empty() {
        return None;
    }

    Some((user, host, path))
}
