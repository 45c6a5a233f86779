//! Error types for the sync engine.
//!
//! `SyncError` represents failures of a whole `sync` call. Per-file failures
//! are recorded on each `EntryOutcome` while the remaining candidates are
//! still attempted; they only surface here as `SyncError::Incomplete` once
//! every candidate has been processed.

use std::io;
use thiserror::Error;

use crate::model::SyncReport;

/// Coarse classification of a `SyncError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself cannot be satisfied (bad locations, no credential, missing source)
    Configuration,
    /// The remote session could not be established
    Connection,
    /// Reading, writing or inspecting a file failed
    Transfer,
    /// A destination directory could not be created
    DirectoryCreation,
}

/// Errors returned by [`crate::sync`] and the components it drives.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Both endpoints name a remote host
    #[error("cannot sync from remote host {from_host} to remote host {to_host}")]
    BothRemote { from_host: String, to_host: String },

    /// A remote endpoint is involved but no login or secret could be determined
    #[error("no credential available for {host}: {reason}")]
    NoCredential { host: String, reason: String },

    /// The source path exists as neither a file nor a directory
    #[error("source not found: {path}")]
    SourceNotFound { path: String },

    /// A directory would have to be mirrored onto an existing non-directory
    #[error("destination exists and is not a directory: {path}")]
    DestinationIsFile { path: String },

    /// The location string could not be used at all
    #[error("invalid location '{raw}': {reason}")]
    InvalidLocation { raw: String, reason: String },

    /// Unreachable host, failed handshake or rejected authentication
    #[error("connection to {host}:{port} failed: {cause}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        cause: io::Error,
    },

    /// Stat of a path needed for planning failed
    #[error("failed to inspect {path}: {cause}")]
    Metadata {
        path: String,
        #[source]
        cause: io::Error,
    },

    /// The source root could not be listed
    #[error("failed to enumerate {path}: {cause}")]
    Enumeration {
        path: String,
        #[source]
        cause: io::Error,
    },

    /// Reading, comparing or writing a single candidate failed
    #[error("failed to transfer {path}: {cause}")]
    Transfer {
        path: String,
        #[source]
        cause: io::Error,
    },

    /// A destination directory could not be created
    #[error("failed to create directory {path}: {cause}")]
    DirectoryCreation {
        path: String,
        #[source]
        cause: io::Error,
    },

    /// Every candidate was attempted but some of them failed
    #[error("{failed} of {attempted} entries failed to sync")]
    Incomplete {
        failed: usize,
        attempted: usize,
        report: Box<SyncReport>,
    },
}

impl SyncError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BothRemote { .. }
            | Self::NoCredential { .. }
            | Self::SourceNotFound { .. }
            | Self::DestinationIsFile { .. }
            | Self::InvalidLocation { .. } => ErrorKind::Configuration,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::DirectoryCreation { .. } => ErrorKind::DirectoryCreation,
            Self::Metadata { .. }
            | Self::Enumeration { .. }
            | Self::Transfer { .. }
            | Self::Incomplete { .. } => ErrorKind::Transfer,
        }
    }

    /// True when no progress at all was possible: the sync stopped before
    /// its candidates were attempted, or lost its remote session midway.
    ///
    /// Only a per-entry `Transfer` and the aggregate `Incomplete` are not
    /// fatal; every other variant is returned before any entry completes.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transfer { .. } | Self::Incomplete { .. })
    }

    /// The report of a sync that ran to completion with failures.
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Incomplete { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }

    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Connection { cause, .. }
            | Self::Metadata { cause, .. }
            | Self::Enumeration { cause, .. }
            | Self::Transfer { cause, .. }
            | Self::DirectoryCreation { cause, .. } => cause.raw_os_error(),
            _ => None,
        }
    }
}
