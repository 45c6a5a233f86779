//! Enumeration of candidate entries under a source root.
//!
//! The walk uses an explicit stack, so depth is bounded only by the
//! filesystem. Symbolic-link cycles are not detected. Listing order is
//! whatever the transport returns.

use log::{debug, warn};
use std::io;

use crate::error::SyncError;
use crate::model::{EntryKind, FileEntry};
use crate::transport::{posix_join, DirectoryListing, Transport};

/// Entries found under a root.
#[derive(Debug, Default)]
pub struct Listing {
    /// Files, plus directories when the walk was recursive
    pub entries: Vec<FileEntry>,

    /// Entries that could not be inspected, listed or named, with the reason
    pub unreadable: Vec<(FileEntry, io::Error)>,
}

/// List `root` and, when `recursive`, everything below it.
///
/// Relative paths are `/`-separated whatever the transport. Directories are
/// reported before their contents. In non-recursive mode nested directories
/// are left out entirely. Failure to list `root` itself is an error; failure
/// on a nested directory, and any name that is not valid UTF-8, is recorded
/// in [`Listing::unreadable`].
pub fn enumerate(
    transport: &dyn Transport,
    root: &str,
    recursive: bool,
) -> Result<Listing, SyncError> {
    let mut listing = Listing::default();

    let children = transport
        .list_directory(root)
        .map_err(|cause| SyncError::Enumeration {
            path: root.to_string(),
            cause,
        })?;

    let mut pending: Vec<(String, DirectoryListing)> = vec![(String::new(), children)];

    while let Some((prefix, children)) = pending.pop() {
        for name in children.undecodable {
            let relative = posix_join(&prefix, &name);
            listing.unreadable.push((
                FileEntry {
                    relative,
                    kind: EntryKind::Other,
                },
                io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            ));
        }

        for name in children.names {
            let relative = posix_join(&prefix, &name);
            let full = transport.join(root, &relative);

            let kind = match transport.kind(&full) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("cannot inspect {} on {}: {}", full, transport.label(), e);
                    let entry = FileEntry {
                        relative,
                        kind: EntryKind::Other,
                    };
                    listing.unreadable.push((entry, e));
                    continue;
                }
            };

            match kind {
                EntryKind::File => listing.entries.push(FileEntry::file(relative)),
                EntryKind::Directory if recursive => match transport.list_directory(&full) {
                    Ok(children) => {
                        listing.entries.push(FileEntry::directory(relative.clone()));
                        pending.push((relative, children));
                    }
                    Err(e) => {
                        warn!("cannot list {} on {}: {}", full, transport.label(), e);
                        listing.unreadable.push((FileEntry::directory(relative), e));
                    }
                },
                EntryKind::Directory => {
                    debug!("{} is a directory and recursion is disabled, skipping", relative)
                }
                EntryKind::Other | EntryKind::Absent => {
                    debug!("{} is neither file nor directory, skipping", relative)
                }
            }
        }
    }

    Ok(listing)
}
