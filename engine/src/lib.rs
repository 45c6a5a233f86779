//! # mirror - One-Way File Synchronization Engine
//!
//! Mirrors a file or directory tree from a source to a destination, either
//! of which may live on a remote host reached over SSH/SFTP.
//!
//! ## Overview
//!
//! Locations are written `[user@]host:path` for remote endpoints and as plain
//! paths for local ones. The engine features:
//! - Trailing-slash semantics familiar from mirroring tools
//! - Change detection by content hash (MD5, SHA-256, BLAKE3) or by size
//! - Recursive enumeration with empty-directory mirroring
//! - Preservation of access and modification times
//! - Per-file error isolation; a failed entry never stops the others
//! - Dry runs that leave the destination untouched
//! - Progress reporting via an observer trait
//!
//! ## Basic Usage
//!
//! ```no_run
//! use mirror::{sync, SyncOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SyncOptions::new().recursive(true).key_file("/home/me/.ssh/id_ed25519");
//!
//! // Contents of ./site land directly in /var/www on the remote host
//! let report = sync("./site/", "deploy@web1:/var/www", &options)?;
//! println!(
//!     "{} created, {} updated, {} skipped",
//!     report.created(),
//!     report.updated(),
//!     report.skipped()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **location**: Parsing of `[user@]host:path` strings
//! - **transport**: Local and remote filesystem access behind one trait
//! - **credentials**: Login name and secret resolution for remote endpoints
//! - **resolver**: Destination layout from trailing-slash rules
//! - **enumerate**: Candidate discovery under the source root
//! - **detect**: Per-file change detection
//! - **checksums**: Content hashing
//! - **sync**: Orchestration of a whole sync
//! - **observer**: Progress callback trait
//! - **model**: Options, outcomes and reports
//! - **error**: Error types and handling

pub mod checksums;
pub mod credentials;
pub mod detect;
pub mod enumerate;
pub mod error;
pub mod location;
pub mod model;
pub mod observer;
pub mod resolver;
pub mod sync;
pub mod transport;

// Re-export main types and functions
pub use checksums::{ChecksumAlgorithm, ChecksumValue};
pub use error::{ErrorKind, SyncError};
pub use location::Location;
pub use model::{
    EntryKind, EntryOutcome, EntryState, FileEntry, SyncOptions, SyncReport, TransferDecision,
    DEFAULT_PORT,
};
pub use observer::SyncObserver;
pub use sync::{sync, Syncer};
pub use transport::{LocalTransport, RemoteTransport, Transport};
