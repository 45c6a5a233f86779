//! Progress reporting hook.
//!
//! `SyncObserver` keeps the sync engine independent of any particular
//! front end. The CLI implements it to print per-entry lines; tests use
//! it to count transfers.

use crate::model::{EntryOutcome, FileEntry, SyncReport};

/// Receives notifications while a sync runs.
///
/// All methods are called synchronously from the syncing thread and have
/// empty default bodies, so implementors only override what they need.
pub trait SyncObserver {
    /// Called once the destination layout is resolved, before any entry.
    fn on_sync_started(&self, _report: &SyncReport) {}

    /// Called when an entry is about to be compared.
    fn on_entry_started(&self, _entry: &FileEntry) {}

    /// Called when an entry reached a terminal state (done, skipped, planned or failed).
    fn on_entry_completed(&self, _outcome: &EntryOutcome) {}

    /// Called after every entry was processed, failed entries included.
    fn on_sync_completed(&self, _report: &SyncReport) {}
}
