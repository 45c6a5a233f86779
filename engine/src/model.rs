//! Core data model for sync operations.
//!
//! This module defines the per-invocation data structures:
//! - SyncOptions: caller-supplied knobs for one `sync` call
//! - FileEntry: a candidate found under the source root
//! - TransferDecision, EntryState: what was decided and what happened
//! - EntryOutcome, SyncReport: the record of a finished invocation
//!
//! Nothing here outlives a single `sync` call.

use std::path::PathBuf;
use std::time::SystemTime;
use uuid::Uuid;

use crate::checksums::ChecksumAlgorithm;

/// Default secure-shell port.
pub const DEFAULT_PORT: u16 = 22;

/// Options for a single sync invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Port of the remote endpoint
    pub port: u16,

    /// Login name; overrides any `user@` in the remote location
    pub username: Option<String>,

    /// Password for the remote endpoint; takes precedence over key files
    pub password: Option<String>,

    /// Private key file for the remote endpoint
    pub key_file: Option<PathBuf>,

    /// Compare byte sizes instead of content hashes
    pub compare_by_size_only: bool,

    /// Descend into subdirectories of a directory source
    pub recursive: bool,

    /// Compute decisions without touching the destination
    pub dry_run: bool,

    /// Hash used when comparing by content
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            port: DEFAULT_PORT,
            username: None,
            password: None,
            key_file: None,
            compare_by_size_only: false,
            recursive: false,
            dry_run: false,
            checksum_algorithm: ChecksumAlgorithm::Md5,
        }
    }
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn key_file(mut self, key_file: impl Into<PathBuf>) -> Self {
        self.key_file = Some(key_file.into());
        self
    }

    pub fn size_only(mut self, size_only: bool) -> Self {
        self.compare_by_size_only = size_only;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn checksum_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }
}

/// What a path turned out to be on a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Exists but is neither (socket, device, dangling link...)
    Other,
    /// Does not exist
    Absent,
}

impl EntryKind {
    pub fn exists(&self) -> bool {
        !matches!(self, EntryKind::Absent)
    }
}

/// A candidate found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the source root, always `/`-separated
    pub relative: String,

    /// File or directory; `Other` only for entries that could not be classified
    pub kind: EntryKind,
}

impl FileEntry {
    pub fn file(relative: impl Into<String>) -> Self {
        FileEntry {
            relative: relative.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(relative: impl Into<String>) -> Self {
        FileEntry {
            relative: relative.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Decision taken once per candidate, before any transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDecision {
    /// Destination matches the source
    SkipIdentical,
    /// Destination does not exist
    CreateMissing,
    /// Destination exists but differs
    UpdateChanged,
}

impl std::fmt::Display for TransferDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferDecision::SkipIdentical => write!(f, "identical"),
            TransferDecision::CreateMissing => write!(f, "missing"),
            TransferDecision::UpdateChanged => write!(f, "changed"),
        }
    }
}

/// The state of an individual candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Not yet processed
    Pending,
    /// Transferred, or directory ensured
    Done,
    /// Identical on both sides
    Skipped,
    /// Would have been transferred, but this is a dry run
    Planned,
    /// Error occurred. A copy that failed mid-stream leaves the destination
    /// file truncated or partially written.
    Failed,
}

impl EntryState {
    /// Returns true if this state is terminal (no further changes expected).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryState::Pending)
    }
}

/// Result of processing one candidate.
#[derive(Debug, Clone)]
pub struct EntryOutcome {
    /// Candidate as enumerated
    pub entry: FileEntry,

    /// Full destination path on the destination transport
    pub destination_path: String,

    /// Decision, if change detection got that far
    pub decision: Option<TransferDecision>,

    pub state: EntryState,

    /// Bytes written to the destination for this entry
    pub bytes_transferred: u64,

    /// Human-readable error message
    pub error_message: Option<String>,
}

impl EntryOutcome {
    pub fn pending(entry: FileEntry, destination_path: String) -> Self {
        EntryOutcome {
            entry,
            destination_path,
            decision: None,
            state: EntryState::Pending,
            bytes_transferred: 0,
            error_message: None,
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.state = EntryState::Failed;
        self.error_message = Some(message);
    }

    /// True when bytes were actually written.
    pub fn transferred(&self) -> bool {
        self.state == EntryState::Done && !self.entry.is_dir()
    }
}

/// Record of one `sync` invocation.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Identifier used in log lines for this invocation
    pub id: Uuid,

    /// Source location as typed by the caller
    pub source: String,

    /// Destination location as typed by the caller
    pub destination: String,

    /// Effective destination root (or target file for a single-file sync)
    pub destination_root: String,

    pub dry_run: bool,

    /// Outcomes in processing order
    pub entries: Vec<EntryOutcome>,

    pub started_at: SystemTime,

    pub finished_at: Option<SystemTime>,
}

impl SyncReport {
    pub fn new(source: &str, destination: &str, dry_run: bool) -> Self {
        SyncReport {
            id: Uuid::new_v4(),
            source: source.to_string(),
            destination: destination.to_string(),
            destination_root: String::new(),
            dry_run,
            entries: Vec::new(),
            started_at: SystemTime::now(),
            finished_at: None,
        }
    }

    fn count_files(&self, decision: TransferDecision) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.entry.is_dir() && e.decision == Some(decision))
            .filter(|e| matches!(e.state, EntryState::Done | EntryState::Planned))
            .count()
    }

    /// Files written because the destination was missing.
    pub fn created(&self) -> usize {
        self.count_files(TransferDecision::CreateMissing)
    }

    /// Files written because the destination differed.
    pub fn updated(&self) -> usize {
        self.count_files(TransferDecision::UpdateChanged)
    }

    /// Entries left alone because they were identical.
    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Skipped)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Failed)
            .count()
    }

    /// Files whose bytes were written during this invocation.
    pub fn transferred(&self) -> usize {
        self.entries.iter().filter(|e| e.transferred()).count()
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.entries.iter().map(|e| e.bytes_transferred).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(relative: &str, decision: TransferDecision, state: EntryState) -> EntryOutcome {
        let mut outcome = EntryOutcome::pending(FileEntry::file(relative), relative.to_string());
        outcome.decision = Some(decision);
        outcome.state = state;
        outcome
    }

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert_eq!(options.port, 22);
        assert!(!options.recursive);
        assert!(!options.dry_run);
        assert!(!options.compare_by_size_only);
        assert_eq!(options.checksum_algorithm, ChecksumAlgorithm::Md5);
    }

    #[test]
    fn test_option_setters_chain() {
        let options = SyncOptions::new()
            .port(2222)
            .username("pod")
            .size_only(true)
            .recursive(true);
        assert_eq!(options.port, 2222);
        assert_eq!(options.username.as_deref(), Some("pod"));
        assert!(options.compare_by_size_only);
        assert!(options.recursive);
    }

    #[test]
    fn test_report_counters() {
        let mut report = SyncReport::new("/a", "/b", false);
        report.entries.push(outcome("new.txt", TransferDecision::CreateMissing, EntryState::Done));
        report.entries.push(outcome("old.txt", TransferDecision::UpdateChanged, EntryState::Done));
        report.entries.push(outcome("same.txt", TransferDecision::SkipIdentical, EntryState::Skipped));
        report.entries.push(outcome("bad.txt", TransferDecision::UpdateChanged, EntryState::Failed));

        assert_eq!(report.created(), 1);
        assert_eq!(report.updated(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.transferred(), 2);
    }

    #[test]
    fn test_directory_outcome_is_not_a_transfer() {
        let mut outcome = EntryOutcome::pending(FileEntry::directory("sub"), "/b/sub".to_string());
        outcome.state = EntryState::Done;
        assert!(!outcome.transferred());
        assert!(outcome.state.is_terminal());
    }
}
