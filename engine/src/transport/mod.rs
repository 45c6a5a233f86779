//! Filesystem access for one endpoint of a sync.
//!
//! `Transport` is implemented by [`LocalTransport`] and [`RemoteTransport`];
//! one is picked per endpoint at the start of a sync and every later query
//! goes through it. Existence checks are answered with [`EntryKind`] rather
//! than errors; `Err` is reserved for failures of the transport itself.

mod local;
mod remote;

#[cfg(test)]
pub(crate) mod memory;

pub use local::LocalTransport;
pub use remote::RemoteTransport;

use filetime::FileTime;
use std::io::{self, Read, Write};

use crate::checksums::{self, ChecksumAlgorithm, ChecksumValue};
use crate::model::EntryKind;

/// Access and modification times of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimes {
    pub accessed: FileTime,
    pub modified: FileTime,
}

/// Immediate children of a directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub names: Vec<String>,

    /// Names that are not valid UTF-8, lossily decoded for reporting only
    pub undecodable: Vec<String>,
}

/// True when `error` means the session to a remote endpoint is gone, as
/// opposed to a problem with one path.
pub fn is_session_failure(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}

/// Capability interface over a local or remote filesystem.
///
/// Paths are passed as strings exactly as the resolver built them.
pub trait Transport {
    /// Short label for log lines ("local", "user@host").
    fn label(&self) -> &str;

    /// True for endpoints reached over a network session.
    fn is_remote(&self) -> bool {
        false
    }

    fn kind(&self, path: &str) -> io::Result<EntryKind>;

    fn is_dir(&self, path: &str) -> io::Result<bool> {
        Ok(self.kind(path)? == EntryKind::Directory)
    }

    fn is_file(&self, path: &str) -> io::Result<bool> {
        Ok(self.kind(path)? == EntryKind::File)
    }

    /// Names of the immediate children of `path`.
    fn list_directory(&self, path: &str) -> io::Result<DirectoryListing>;

    /// Create `path` and any missing parents. No-op if it already exists.
    fn mkdir_all(&self, path: &str) -> io::Result<()>;

    fn size(&self, path: &str) -> io::Result<u64>;

    fn times(&self, path: &str) -> io::Result<FileTimes>;

    fn set_times(&self, path: &str, times: FileTimes) -> io::Result<()>;

    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;

    /// Create or truncate `path` for writing. The parent must exist.
    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + '_>>;

    /// Join a `/`-separated relative path onto `base`.
    fn join(&self, base: &str, relative: &str) -> String;

    /// Whole-file hash, read through this transport.
    fn content_hash(&self, path: &str, algorithm: ChecksumAlgorithm) -> io::Result<ChecksumValue> {
        checksums::hash_reader(self.open_read(path)?, algorithm)
    }
}

/// Copy one file between transports and carry its times over.
///
/// Returns the number of bytes written.
pub fn copy_file(
    source: &dyn Transport,
    source_path: &str,
    destination: &dyn Transport,
    destination_path: &str,
) -> io::Result<u64> {
    let times = source.times(source_path)?;

    let mut reader = source.open_read(source_path)?;
    let mut writer = destination.open_write(destination_path)?;
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    // Close the handle before touching times, or the close may bump mtime
    drop(writer);

    destination.set_times(destination_path, times)?;
    Ok(bytes)
}

/// `/`-join used for remote paths and for relative candidate paths.
pub(crate) fn posix_join(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        base.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}
