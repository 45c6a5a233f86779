//! Destination resolution with mirroring-tool trailing-slash semantics.
//!
//! | source    | trailing slash        | destination                          |
//! |-----------|-----------------------|--------------------------------------|
//! | file      | on destination        | `dest/basename(src)`                 |
//! | file      | none                  | `dest` itself names the file         |
//! | directory | on neither            | contents land in `dest/basename(src)`|
//! | directory | on either             | contents land in `dest`              |

use log::debug;

use crate::error::SyncError;
use crate::location::{is_separator, Location};
use crate::model::EntryKind;
use crate::transport::Transport;

/// Where candidates come from and where they land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// One file copied to an exact destination path
    SingleFile {
        name: String,
        source: String,
        target: String,
    },
    /// A directory's contents mirrored under a destination root
    Tree {
        source_root: String,
        destination_root: String,
    },
}

/// Outcome of path resolution for one sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub layout: Layout,

    /// Directory to ensure on the destination before any transfer
    pub create_dir: Option<String>,
}

impl SyncPlan {
    pub fn is_file_only(&self) -> bool {
        matches!(self.layout, Layout::SingleFile { .. })
    }

    /// Destination root for a tree, target path for a single file.
    pub fn destination_root(&self) -> &str {
        match &self.layout {
            Layout::SingleFile { target, .. } => target,
            Layout::Tree { destination_root, .. } => destination_root,
        }
    }
}

/// Last path component, ignoring trailing separators. `None` for roots and
/// for `.`/`..`, which have no usable name.
pub fn basename(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(is_separator);
    let name = match trimmed.rfind(is_separator) {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    };
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

/// Parent directory when `path` has an intermediate component.
pub fn parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(is_separator);
    let i = trimmed.rfind(is_separator)?;
    let parent = trimmed[..i].trim_end_matches(is_separator);
    if parent.is_empty() {
        // Parent is the filesystem root
        None
    } else {
        Some(parent)
    }
}

fn inspect(transport: &dyn Transport, path: &str) -> Result<EntryKind, SyncError> {
    transport.kind(path).map_err(|cause| SyncError::Metadata {
        path: path.to_string(),
        cause,
    })
}

/// Compute the destination layout for a source of kind `source_kind`.
pub fn resolve(
    source: &Location,
    source_kind: EntryKind,
    destination: &Location,
    destination_transport: &dyn Transport,
) -> Result<SyncPlan, SyncError> {
    let plan = match source_kind {
        EntryKind::File => {
            let name = basename(&source.path)
                .ok_or_else(|| SyncError::SourceNotFound {
                    path: source.path.clone(),
                })?
                .to_string();

            // Unlike the table above, an existing directory without a trailing
            // slash also receives the file inside it instead of being overwritten
            let into_directory = destination.trailing_slash
                || inspect(destination_transport, &destination.path)? == EntryKind::Directory;

            if into_directory {
                SyncPlan {
                    layout: Layout::SingleFile {
                        target: destination_transport.join(&destination.path, &name),
                        source: source.path.clone(),
                        name,
                    },
                    create_dir: Some(destination.path.clone()),
                }
            } else {
                SyncPlan {
                    layout: Layout::SingleFile {
                        target: destination.path.clone(),
                        source: source.path.clone(),
                        name,
                    },
                    create_dir: parent(&destination.path).map(str::to_string),
                }
            }
        }
        EntryKind::Directory => {
            let wrap = !source.trailing_slash && !destination.trailing_slash;
            let destination_root = match basename(&source.path) {
                Some(name) if wrap => {
                    let kind = inspect(destination_transport, &destination.path)?;
                    if matches!(kind, EntryKind::File | EntryKind::Other) {
                        return Err(SyncError::DestinationIsFile {
                            path: destination.path.clone(),
                        });
                    }
                    destination_transport.join(&destination.path, name)
                }
                _ => destination.path.clone(),
            };

            let kind = inspect(destination_transport, &destination_root)?;
            if matches!(kind, EntryKind::File | EntryKind::Other) {
                return Err(SyncError::DestinationIsFile {
                    path: destination_root,
                });
            }

            SyncPlan {
                layout: Layout::Tree {
                    source_root: source.path.clone(),
                    destination_root: destination_root.clone(),
                },
                create_dir: Some(destination_root),
            }
        }
        EntryKind::Other | EntryKind::Absent => {
            return Err(SyncError::SourceNotFound {
                path: source.path.clone(),
            })
        }
    };

    debug!("resolved {} -> {:?}", source, plan);
    Ok(plan)
}
