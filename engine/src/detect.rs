//! Change detection between a source file and its destination counterpart.

use log::debug;
use std::io;

use crate::checksums::ChecksumAlgorithm;
use crate::model::{EntryKind, SyncOptions, TransferDecision};
use crate::transport::Transport;

/// Comparison key used to decide whether two files differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Whole-file content hash; exact, but reads both files completely
    Content(ChecksumAlgorithm),
    /// Byte size only; equal sizes with different content count as identical
    Size,
}

impl Comparison {
    pub fn from_options(options: &SyncOptions) -> Self {
        if options.compare_by_size_only {
            Comparison::Size
        } else {
            Comparison::Content(options.checksum_algorithm)
        }
    }
}

/// Decide what to do with `source_path` given `destination_path`.
///
/// A missing destination is `CreateMissing`, never an error. A destination
/// that exists as something other than a file cannot be overwritten and is
/// reported as an error.
pub fn differs(
    source: &dyn Transport,
    source_path: &str,
    destination: &dyn Transport,
    destination_path: &str,
    comparison: Comparison,
) -> io::Result<TransferDecision> {
    match destination.kind(destination_path)? {
        EntryKind::Absent => return Ok(TransferDecision::CreateMissing),
        EntryKind::File => {}
        EntryKind::Directory | EntryKind::Other => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a regular file", destination_path),
            ))
        }
    }

    let identical = match comparison {
        Comparison::Size => {
            let (src, dst) = (source.size(source_path)?, destination.size(destination_path)?);
            debug!("size {} {} / {} {}", source_path, src, destination_path, dst);
            src == dst
        }
        Comparison::Content(algorithm) => {
            // Sizes differ means content differs; skip reading both files
            if source.size(source_path)? != destination.size(destination_path)? {
                false
            } else {
                let src = source.content_hash(source_path, algorithm)?;
                let dst = destination.content_hash(destination_path, algorithm)?;
                debug!("hash {} {} / {} {}", source_path, src, destination_path, dst);
                src == dst
            }
        }
    };

    Ok(if identical {
        TransferDecision::SkipIdentical
    } else {
        TransferDecision::UpdateChanged
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryTransport;

    const HASH: Comparison = Comparison::Content(ChecksumAlgorithm::Md5);

    #[test]
    fn test_missing_destination() {
        let src = MemoryTransport::new();
        src.add_file("/a.txt", b"X", 0);
        let dst = MemoryTransport::new();

        let decision = differs(&src, "/a.txt", &dst, "/a.txt", HASH).expect("Failed to compare");
        assert_eq!(decision, TransferDecision::CreateMissing);
    }

    #[test]
    fn test_identical_content() {
        let src = MemoryTransport::new();
        src.add_file("/a.txt", b"same", 10);
        let dst = MemoryTransport::new();
        dst.add_file("/copy.txt", b"same", 20);

        let decision = differs(&src, "/a.txt", &dst, "/copy.txt", HASH).expect("Failed to compare");
        assert_eq!(decision, TransferDecision::SkipIdentical);
    }

    #[test]
    fn test_changed_content_same_size() {
        let src = MemoryTransport::new();
        src.add_file("/a.txt", b"abcd", 0);
        let dst = MemoryTransport::new();
        dst.add_file("/a.txt", b"abce", 0);

        let decision = differs(&src, "/a.txt", &dst, "/a.txt", HASH).expect("Failed to compare");
        assert_eq!(decision, TransferDecision::UpdateChanged);
    }

    #[test]
    fn test_size_only_misses_equal_size_changes() {
        // Known false negative of size-only comparison
        let src = MemoryTransport::new();
        src.add_file("/a.txt", b"abcd", 0);
        let dst = MemoryTransport::new();
        dst.add_file("/a.txt", b"wxyz", 0);

        let decision =
            differs(&src, "/a.txt", &dst, "/a.txt", Comparison::Size).expect("Failed to compare");
        assert_eq!(decision, TransferDecision::SkipIdentical);
    }

    #[test]
    fn test_size_only_detects_size_change() {
        let src = MemoryTransport::new();
        src.add_file("/a.txt", b"abcd", 0);
        let dst = MemoryTransport::new();
        dst.add_file("/a.txt", b"abc", 0);

        let decision =
            differs(&src, "/a.txt", &dst, "/a.txt", Comparison::Size).expect("Failed to compare");
        assert_eq!(decision, TransferDecision::UpdateChanged);
    }

    #[test]
    fn test_directory_at_destination_is_an_error() {
        let src = MemoryTransport::new();
        src.add_file("/a.txt", b"X", 0);
        let dst = MemoryTransport::new();
        dst.add_dir("/a.txt");

        assert!(differs(&src, "/a.txt", &dst, "/a.txt", HASH).is_err());
    }

    #[test]
    fn test_comparison_from_options() {
        let options = SyncOptions::new().size_only(true);
        assert_eq!(Comparison::from_options(&options), Comparison::Size);

        let options = SyncOptions::new().checksum_algorithm(ChecksumAlgorithm::Blake3);
        assert_eq!(
            Comparison::from_options(&options),
            Comparison::Content(ChecksumAlgorithm::Blake3)
        );
    }
}
