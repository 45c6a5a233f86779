//! Sync orchestration.
//!
//! A sync runs in four phases:
//! 1. Parse both locations and pick a transport for each endpoint
//! 2. Resolve the destination layout and ensure its directory exists
//! 3. Enumerate candidates under the source
//! 4. Compare and transfer each candidate, recording one outcome per entry
//!
//! Failures in phases 1 and 2 abort the sync. Failures in phase 4 are
//! recorded on the entry and the remaining candidates are still attempted,
//! unless the remote session itself was lost, which aborts with
//! `SyncError::Connection`.

use log::{debug, info, warn};
use std::io;
use std::time::SystemTime;

use crate::credentials::Credentials;
use crate::detect::{self, Comparison};
use crate::enumerate;
use crate::error::SyncError;
use crate::location::Location;
use crate::model::{
    EntryKind, EntryOutcome, EntryState, FileEntry, SyncOptions, SyncReport, TransferDecision,
};
use crate::observer::SyncObserver;
use crate::resolver::{self, Layout};
use crate::transport::{self, LocalTransport, RemoteTransport, Transport};

/// Mirror `source` onto `destination` with the given options.
///
/// Shorthand for `Syncer::new(options).sync(source, destination)`.
pub fn sync(source: &str, destination: &str, options: &SyncOptions) -> Result<SyncReport, SyncError> {
    Syncer::new(options).sync(source, destination)
}

/// Drives one or more syncs with a fixed set of options.
pub struct Syncer<'a> {
    options: &'a SyncOptions,
    observer: Option<&'a dyn SyncObserver>,
}

/// Source and destination paths of one candidate.
struct Candidate {
    entry: FileEntry,
    source_path: String,
    destination_path: String,
    /// Directory that must exist before the file can be written
    parent_dir: Option<String>,
}

/// The underlying cause when a per-entry error means a remote session is gone.
fn into_session_failure(err: SyncError) -> Option<io::Error> {
    match err {
        SyncError::Transfer { cause, .. } | SyncError::DirectoryCreation { cause, .. }
            if transport::is_session_failure(&cause) =>
        {
            Some(cause)
        }
        _ => None,
    }
}

fn parse_location(raw: &str) -> Result<Location, SyncError> {
    if raw.trim().is_empty() {
        return Err(SyncError::InvalidLocation {
            raw: raw.to_string(),
            reason: "location is empty".to_string(),
        });
    }
    Ok(Location::parse(raw))
}

impl<'a> Syncer<'a> {
    pub fn new(options: &'a SyncOptions) -> Self {
        Syncer {
            options,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn SyncObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Parse both locations, connect to the remote side if there is one,
    /// and mirror `source` onto `destination`.
    ///
    /// At most one side may be remote. The remote session, if any, is closed
    /// before this returns, on success and on failure alike.
    pub fn sync(&self, source: &str, destination: &str) -> Result<SyncReport, SyncError> {
        let source_loc = parse_location(source)?;
        let destination_loc = parse_location(destination)?;
        let local = LocalTransport::new();

        match (&source_loc.host, &destination_loc.host) {
            (Some(from_host), Some(to_host)) => Err(SyncError::BothRemote {
                from_host: from_host.clone(),
                to_host: to_host.clone(),
            }),
            (Some(host), None) => {
                let remote = self.connect(host, source_loc.user.as_deref())?;
                self.sync_between(&remote, &source_loc, &local, &destination_loc)
            }
            (None, Some(host)) => {
                let remote = self.connect(host, destination_loc.user.as_deref())?;
                self.sync_between(&local, &source_loc, &remote, &destination_loc)
            }
            (None, None) => self.sync_between(&local, &source_loc, &local, &destination_loc),
        }
    }

    fn connect(&self, host: &str, location_user: Option<&str>) -> Result<RemoteTransport, SyncError> {
        let credentials = Credentials::resolve(self.options, location_user, host)?;
        RemoteTransport::connect(host, self.options.port, &credentials)
    }

    /// Mirror `source_loc` on `source` onto `destination_loc` on `destination`.
    ///
    /// Returns the report when every entry succeeded, and
    /// [`SyncError::Incomplete`] carrying the same report otherwise.
    pub fn sync_between(
        &self,
        source: &dyn Transport,
        source_loc: &Location,
        destination: &dyn Transport,
        destination_loc: &Location,
    ) -> Result<SyncReport, SyncError> {
        let source_kind = source
            .kind(&source_loc.path)
            .map_err(|cause| SyncError::Metadata {
                path: source_loc.path.clone(),
                cause,
            })?;
        let plan = resolver::resolve(source_loc, source_kind, destination_loc, destination)?;

        let mut report = SyncReport::new(
            &source_loc.to_string(),
            &destination_loc.to_string(),
            self.options.dry_run,
        );
        report.destination_root = plan.destination_root().to_string();
        info!(
            "[{}] syncing {} on {} to {} on {}{}",
            report.id,
            source_loc.path,
            source.label(),
            report.destination_root,
            destination.label(),
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        if !self.options.dry_run {
            if let Some(dir) = &plan.create_dir {
                destination
                    .mkdir_all(dir)
                    .map_err(|cause| SyncError::DirectoryCreation {
                        path: dir.clone(),
                        cause,
                    })?;
            }
        }

        let candidates = match &plan.layout {
            Layout::SingleFile {
                name,
                source: source_path,
                target,
            } => vec![Candidate {
                entry: FileEntry::file(name.as_str()),
                source_path: source_path.clone(),
                destination_path: target.clone(),
                parent_dir: None,
            }],
            Layout::Tree {
                source_root,
                destination_root,
            } => {
                let listing = enumerate::enumerate(source, source_root, self.options.recursive)?;
                for (entry, cause) in listing.unreadable {
                    let message = SyncError::Enumeration {
                        path: source.join(source_root, &entry.relative),
                        cause,
                    }
                    .to_string();
                    let path = destination.join(destination_root, &entry.relative);
                    let mut outcome = EntryOutcome::pending(entry, path);
                    outcome.fail(message);
                    report.entries.push(outcome);
                }

                listing
                    .entries
                    .into_iter()
                    .map(|entry| Candidate {
                        source_path: source.join(source_root, &entry.relative),
                        destination_path: destination.join(destination_root, &entry.relative),
                        parent_dir: entry
                            .relative
                            .rsplit_once('/')
                            .map(|(parent, _)| destination.join(destination_root, parent)),
                        entry,
                    })
                    .collect()
            }
        };
        debug!("[{}] {} candidates", report.id, candidates.len());

        if let Some(observer) = self.observer {
            observer.on_sync_started(&report);
            for outcome in &report.entries {
                observer.on_entry_completed(outcome);
            }
        }

        let comparison = Comparison::from_options(self.options);
        for candidate in candidates {
            if let Some(observer) = self.observer {
                observer.on_entry_started(&candidate.entry);
            }

            let mut outcome = EntryOutcome::pending(candidate.entry, candidate.destination_path);
            let result = if outcome.entry.is_dir() {
                self.ensure_directory(destination, &mut outcome)
            } else {
                self.sync_file(
                    source,
                    &candidate.source_path,
                    destination,
                    candidate.parent_dir.as_deref(),
                    comparison,
                    &mut outcome,
                )
            };

            let mut session_lost = None;
            match result {
                Ok(()) => debug!(
                    "[{}] {} {:?} ({})",
                    report.id,
                    outcome.entry.relative,
                    outcome.state,
                    outcome
                        .decision
                        .map(|d| d.to_string())
                        .unwrap_or_default()
                ),
                Err(err) => {
                    warn!("[{}] {}", report.id, err);
                    outcome.fail(err.to_string());
                    session_lost = into_session_failure(err);
                }
            }

            if let Some(observer) = self.observer {
                observer.on_entry_completed(&outcome);
            }
            report.entries.push(outcome);

            if let Some(cause) = session_lost {
                let remote = if destination.is_remote() { destination } else { source };
                warn!(
                    "[{}] session to {} lost, abandoning the remaining entries",
                    report.id,
                    remote.label()
                );
                report.finished_at = Some(SystemTime::now());
                if let Some(observer) = self.observer {
                    observer.on_sync_completed(&report);
                }
                return Err(SyncError::Connection {
                    host: remote.label().to_string(),
                    port: self.options.port,
                    cause,
                });
            }
        }

        report.finished_at = Some(SystemTime::now());
        info!(
            "[{}] finished: {} created, {} updated, {} skipped, {} failed, {} bytes",
            report.id,
            report.created(),
            report.updated(),
            report.skipped(),
            report.failed(),
            report.bytes_transferred()
        );

        if let Some(observer) = self.observer {
            observer.on_sync_completed(&report);
        }

        let failed = report.failed();
        if failed > 0 {
            return Err(SyncError::Incomplete {
                failed,
                attempted: report.entries.len(),
                report: Box::new(report),
            });
        }
        Ok(report)
    }

    fn ensure_directory(
        &self,
        destination: &dyn Transport,
        outcome: &mut EntryOutcome,
    ) -> Result<(), SyncError> {
        let path = outcome.destination_path.clone();
        let directory_error = |cause: io::Error| SyncError::DirectoryCreation {
            path: path.clone(),
            cause,
        };

        match destination.kind(&path).map_err(directory_error)? {
            EntryKind::Directory => {
                outcome.decision = Some(TransferDecision::SkipIdentical);
                outcome.state = EntryState::Skipped;
            }
            EntryKind::Absent => {
                outcome.decision = Some(TransferDecision::CreateMissing);
                if self.options.dry_run {
                    outcome.state = EntryState::Planned;
                } else {
                    destination
                        .mkdir_all(&path)
                        .map_err(directory_error)?;
                    outcome.state = EntryState::Done;
                }
            }
            EntryKind::File | EntryKind::Other => {
                return Err(directory_error(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "exists and is not a directory",
                )))
            }
        }
        Ok(())
    }

    fn sync_file(
        &self,
        source: &dyn Transport,
        source_path: &str,
        destination: &dyn Transport,
        parent_dir: Option<&str>,
        comparison: Comparison,
        outcome: &mut EntryOutcome,
    ) -> Result<(), SyncError> {
        let transfer_error = |cause: io::Error| SyncError::Transfer {
            path: source_path.to_string(),
            cause,
        };

        let decision = detect::differs(
            source,
            source_path,
            destination,
            &outcome.destination_path,
            comparison,
        )
        .map_err(transfer_error)?;
        outcome.decision = Some(decision);

        if decision == TransferDecision::SkipIdentical {
            outcome.state = EntryState::Skipped;
            return Ok(());
        }
        if self.options.dry_run {
            outcome.state = EntryState::Planned;
            return Ok(());
        }

        if let Some(dir) = parent_dir {
            destination
                .mkdir_all(dir)
                .map_err(|cause| SyncError::DirectoryCreation {
                    path: dir.to_string(),
                    cause,
                })?;
        }
        outcome.bytes_transferred =
            transport::copy_file(source, source_path, destination, &outcome.destination_path)
                .map_err(transfer_error)?;
        outcome.state = EntryState::Done;
        Ok(())
    }
}
