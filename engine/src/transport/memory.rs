//! In-memory POSIX-style filesystem standing in for a remote host in tests.

use filetime::FileTime;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Write};

use super::{posix_join, DirectoryListing, FileTimes, Transport};
use crate::model::EntryKind;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { data: Vec<u8>, times: FileTimes },
}

pub(crate) struct MemoryTransport {
    nodes: RefCell<BTreeMap<String, Node>>,
    writes: Cell<usize>,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.replace("//", "/")
    }
}

fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(i) => Some(&path[..i]),
        None => None,
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path))
}

impl MemoryTransport {
    pub(crate) fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        MemoryTransport {
            nodes: RefCell::new(nodes),
            writes: Cell::new(0),
        }
    }

    pub(crate) fn add_dir(&self, path: &str) {
        self.mkdir_all(path).expect("Failed to add directory");
    }

    pub(crate) fn add_file(&self, path: &str, data: &[u8], mtime: i64) {
        let path = normalize(path);
        if let Some(parent) = parent(&path) {
            self.add_dir(parent);
        }
        let time = FileTime::from_unix_time(mtime, 0);
        self.nodes.borrow_mut().insert(
            path,
            Node::File {
                data: data.to_vec(),
                times: FileTimes {
                    accessed: time,
                    modified: time,
                },
            },
        );
    }

    pub(crate) fn read(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.borrow().get(&normalize(path)) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    pub(crate) fn modified(&self, path: &str) -> Option<i64> {
        match self.nodes.borrow().get(&normalize(path)) {
            Some(Node::File { times, .. }) => Some(times.modified.unix_seconds()),
            _ => None,
        }
    }

    /// Number of files opened for writing so far.
    pub(crate) fn writes(&self) -> usize {
        self.writes.get()
    }
}

struct MemoryWriter<'a> {
    transport: &'a MemoryTransport,
    path: String,
    buffer: Vec<u8>,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryWriter<'_> {
    fn drop(&mut self) {
        let time = FileTime::from_unix_time(0, 0);
        self.transport.nodes.borrow_mut().insert(
            self.path.clone(),
            Node::File {
                data: std::mem::take(&mut self.buffer),
                times: FileTimes {
                    accessed: time,
                    modified: time,
                },
            },
        );
    }
}

impl Transport for MemoryTransport {
    fn label(&self) -> &str {
        "memory"
    }

    fn kind(&self, path: &str) -> io::Result<EntryKind> {
        Ok(match self.nodes.borrow().get(&normalize(path)) {
            Some(Node::Dir) => EntryKind::Directory,
            Some(Node::File { .. }) => EntryKind::File,
            None => EntryKind::Absent,
        })
    }

    fn list_directory(&self, path: &str) -> io::Result<DirectoryListing> {
        let dir = normalize(path);
        if self.kind(&dir)? != EntryKind::Directory {
            return Err(not_found(&dir));
        }
        let prefix = if dir == "/" { dir.clone() } else { format!("{}/", dir) };
        let nodes = self.nodes.borrow();
        let names = nodes
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect();
        Ok(DirectoryListing {
            names,
            undecodable: Vec::new(),
        })
    }

    fn mkdir_all(&self, path: &str) -> io::Result<()> {
        let path = normalize(path);
        let mut prefix = if path.starts_with('/') { "/".to_string() } else { String::new() };
        for component in path.split('/').filter(|c| !c.is_empty()) {
            prefix = posix_join(&prefix, component);
            match self.kind(&prefix)? {
                EntryKind::Directory => {}
                EntryKind::Absent => {
                    self.nodes.borrow_mut().insert(prefix.clone(), Node::Dir);
                }
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} is a file", prefix),
                    ))
                }
            }
        }
        Ok(())
    }

    fn size(&self, path: &str) -> io::Result<u64> {
        self.read(path).map(|d| d.len() as u64).ok_or_else(|| not_found(path))
    }

    fn times(&self, path: &str) -> io::Result<FileTimes> {
        match self.nodes.borrow().get(&normalize(path)) {
            Some(Node::File { times, .. }) => Ok(*times),
            _ => Err(not_found(path)),
        }
    }

    fn set_times(&self, path: &str, new_times: FileTimes) -> io::Result<()> {
        match self.nodes.borrow_mut().get_mut(&normalize(path)) {
            Some(Node::File { times, .. }) => {
                *times = new_times;
                Ok(())
            }
            _ => Err(not_found(path)),
        }
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let data = self.read(path).ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + '_>> {
        let path = normalize(path);
        let parent_dir = parent(&path).unwrap_or("/");
        if self.kind(parent_dir)? != EntryKind::Directory {
            return Err(not_found(parent_dir));
        }
        if self.kind(&path)? == EntryKind::Directory {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{} is a directory", path)));
        }
        self.writes.set(self.writes.get() + 1);
        Ok(Box::new(MemoryWriter {
            transport: self,
            path,
            buffer: Vec::new(),
        }))
    }

    fn join(&self, base: &str, relative: &str) -> String {
        posix_join(base, relative)
    }
}
