use filetime::FileTime;
use log::warn;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use super::{DirectoryListing, FileTimes, Transport};
use crate::model::EntryKind;

/// The local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransport;

impl LocalTransport {
    pub fn new() -> Self {
        LocalTransport
    }
}

impl Transport for LocalTransport {
    fn label(&self) -> &str {
        "local"
    }

    fn kind(&self, path: &str) -> io::Result<EntryKind> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(EntryKind::Directory),
            Ok(metadata) if metadata.is_file() => Ok(EntryKind::File),
            Ok(_) => Ok(EntryKind::Other),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Absent),
            Err(e) => Err(e),
        }
    }

    fn list_directory(&self, path: &str) -> io::Result<DirectoryListing> {
        let mut listing = DirectoryListing::default();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => listing.names.push(name),
                Err(raw) => {
                    warn!("cannot represent name {:?} in {}", raw, path);
                    listing.undecodable.push(raw.to_string_lossy().into_owned());
                }
            }
        }
        Ok(listing)
    }

    fn mkdir_all(&self, path: &str) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn size(&self, path: &str) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn times(&self, path: &str) -> io::Result<FileTimes> {
        let metadata = fs::metadata(path)?;
        Ok(FileTimes {
            accessed: FileTime::from_last_access_time(&metadata),
            modified: FileTime::from_last_modification_time(&metadata),
        })
    }

    fn set_times(&self, path: &str, times: FileTimes) -> io::Result<()> {
        filetime::set_file_times(path, times.accessed, times.modified)
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(io::BufReader::new(fs::File::open(path)?)))
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(io::BufWriter::new(fs::File::create(path)?)))
    }

    fn join(&self, base: &str, relative: &str) -> String {
        if relative.is_empty() {
            return base.to_string();
        }
        Path::new(base).join(relative).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_kind_is_tri_state() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, "X").expect("Failed to write file");

        let local = LocalTransport::new();
        assert_eq!(local.kind(&path_str(temp_dir.path())).unwrap(), EntryKind::Directory);
        assert_eq!(local.kind(&path_str(&file)).unwrap(), EntryKind::File);
        assert_eq!(
            local.kind(&path_str(&temp_dir.path().join("missing"))).unwrap(),
            EntryKind::Absent
        );
    }

    #[test]
    fn test_list_directory_immediate_children() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("a.txt"), "X").expect("Failed to write file");
        fs::create_dir_all(temp_dir.path().join("sub/deeper")).expect("Failed to create dirs");

        let local = LocalTransport::new();
        let mut names = local
            .list_directory(&path_str(temp_dir.path()))
            .expect("Failed to list")
            .names;
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "sub".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_directory_reports_undecodable_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("a.txt"), "X").expect("Failed to write file");
        let raw = OsStr::from_bytes(b"bad\xffname.txt");
        if fs::write(temp_dir.path().join(raw), "Y").is_err() {
            // Filesystem refuses non UTF-8 names
            return;
        }

        let listing = LocalTransport::new()
            .list_directory(&path_str(temp_dir.path()))
            .expect("Failed to list");
        assert_eq!(listing.names, vec!["a.txt".to_string()]);
        assert_eq!(listing.undecodable, vec!["bad\u{fffd}name.txt".to_string()]);
    }

    #[test]
    fn test_mkdir_all_is_idempotent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let nested = path_str(&temp_dir.path().join("x/y/z"));

        let local = LocalTransport::new();
        local.mkdir_all(&nested).expect("First mkdir failed");
        local.mkdir_all(&nested).expect("Second mkdir failed");
        assert!(local.is_dir(&nested).unwrap());
    }

    #[test]
    fn test_set_times_round_trip() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = path_str(&temp_dir.path().join("a.txt"));
        fs::write(&file, "X").expect("Failed to write file");

        let local = LocalTransport::new();
        let times = FileTimes {
            accessed: FileTime::from_unix_time(1_500_000_000, 0),
            modified: FileTime::from_unix_time(1_400_000_000, 0),
        };
        local.set_times(&file, times).expect("Failed to set times");

        let read_back = local.times(&file).expect("Failed to read times");
        assert_eq!(read_back.modified, times.modified);
    }

    #[test]
    fn test_join_relative_posix_path() {
        let local = LocalTransport::new();
        let joined = local.join("/tmp/out", "sub/b.txt");
        assert_eq!(Path::new(&joined), Path::new("/tmp/out/sub/b.txt"));
        assert_eq!(local.join("/tmp/out", ""), "/tmp/out");
    }
}
