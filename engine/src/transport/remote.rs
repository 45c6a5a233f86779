use filetime::FileTime;
use log::{debug, info, warn};
use ssh2::{ErrorCode, FileStat, Session, Sftp};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::Path;

use super::{posix_join, DirectoryListing, FileTimes, Transport};
use crate::credentials::{Credentials, Secret};
use crate::error::SyncError;
use crate::model::EntryKind;

/// SFTP status codes concern one path; any other libssh2 failure means the
/// session itself is unusable.
fn io_error(e: ssh2::Error) -> io::Error {
    match e.code() {
        ErrorCode::SFTP(_) => e.into(),
        _ => io::Error::new(io::ErrorKind::ConnectionAborted, e),
    }
}

/// A remote filesystem reached over one authenticated SFTP session.
///
/// The session is opened by [`RemoteTransport::connect`] and closed when the
/// value is dropped, whichever way the sync ends.
pub struct RemoteTransport {
    label: String,
    sftp: Option<Sftp>,
    session: Session,
}

impl RemoteTransport {
    /// Connect, handshake and authenticate. Any failure here is fatal.
    pub fn connect(host: &str, port: u16, credentials: &Credentials) -> Result<Self, SyncError> {
        let connection_error = |cause: io::Error| SyncError::Connection {
            host: host.to_string(),
            port,
            cause,
        };

        debug!("connecting to {}:{}", host, port);
        let tcp = TcpStream::connect((host, port)).map_err(connection_error)?;

        let mut session = Session::new().map_err(|e| connection_error(e.into()))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| connection_error(e.into()))?;

        let auth = match &credentials.secret {
            Secret::Password(password) => session.userauth_password(&credentials.username, password),
            Secret::KeyFile(key_file) => {
                session.userauth_pubkey_file(&credentials.username, None, key_file, None)
            }
        };
        auth.map_err(|e| connection_error(e.into()))?;

        if !session.authenticated() {
            return Err(connection_error(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "authentication rejected",
            )));
        }

        let sftp = session.sftp().map_err(|e| connection_error(e.into()))?;
        let label = format!("{}@{}", credentials.username, host);
        info!("connected to {}:{}", label, port);

        Ok(RemoteTransport {
            label,
            sftp: Some(sftp),
            session,
        })
    }

    fn sftp(&self) -> io::Result<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "sftp channel closed"))
    }

    fn stat(&self, path: &str) -> io::Result<FileStat> {
        self.sftp()?.stat(Path::new(path)).map_err(io_error)
    }
}

impl Transport for RemoteTransport {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn kind(&self, path: &str) -> io::Result<EntryKind> {
        match self.sftp()?.stat(Path::new(path)) {
            Ok(stat) if stat.is_dir() => Ok(EntryKind::Directory),
            Ok(stat) if stat.is_file() => Ok(EntryKind::File),
            Ok(_) => Ok(EntryKind::Other),
            // Any SFTP status (no such file, permission denied, ...) means "not usable here"
            Err(e) if matches!(e.code(), ErrorCode::SFTP(_)) => Ok(EntryKind::Absent),
            Err(e) => Err(io_error(e)),
        }
    }

    fn list_directory(&self, path: &str) -> io::Result<DirectoryListing> {
        let entries = self.sftp()?.readdir(Path::new(path)).map_err(io_error)?;
        let mut listing = DirectoryListing::default();
        for (entry, _) in entries {
            let Some(name) = entry.file_name() else {
                continue;
            };
            match name.to_str() {
                Some("." | "..") => {}
                Some(name) => listing.names.push(name.to_string()),
                None => {
                    warn!("cannot represent name {:?} in {} on {}", name, path, self.label);
                    listing.undecodable.push(name.to_string_lossy().into_owned());
                }
            }
        }
        Ok(listing)
    }

    fn mkdir_all(&self, path: &str) -> io::Result<()> {
        // SFTP mkdir has no parents mode; create each missing component
        let sftp = self.sftp()?;
        let mut prefix = if path.starts_with('/') {
            "/".to_string()
        } else {
            String::new()
        };

        for component in path.split('/').filter(|c| !c.is_empty()) {
            prefix = posix_join(&prefix, component);
            match self.kind(&prefix)? {
                EntryKind::Directory => continue,
                EntryKind::Absent => {
                    debug!("creating remote directory {}", prefix);
                    sftp.mkdir(Path::new(&prefix), 0o755).map_err(io_error)?;
                }
                EntryKind::File | EntryKind::Other => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} exists and is not a directory", prefix),
                    ));
                }
            }
        }
        Ok(())
    }

    fn size(&self, path: &str) -> io::Result<u64> {
        self.stat(path)?.size.ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, format!("server reported no size for {}", path))
        })
    }

    fn times(&self, path: &str) -> io::Result<FileTimes> {
        let stat = self.stat(path)?;
        let modified = stat.mtime.unwrap_or(0);
        let accessed = stat.atime.unwrap_or(modified);
        Ok(FileTimes {
            accessed: FileTime::from_unix_time(accessed as i64, 0),
            modified: FileTime::from_unix_time(modified as i64, 0),
        })
    }

    fn set_times(&self, path: &str, times: FileTimes) -> io::Result<()> {
        let stat = FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: None,
            atime: Some(times.accessed.unix_seconds().max(0) as u64),
            mtime: Some(times.modified.unix_seconds().max(0) as u64),
        };
        self.sftp()?.setstat(Path::new(path), stat).map_err(io_error)
    }

    fn open_read(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.sftp()?.open(Path::new(path)).map_err(io_error)?))
    }

    fn open_write(&self, path: &str) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(self.sftp()?.create(Path::new(path)).map_err(io_error)?))
    }

    fn join(&self, base: &str, relative: &str) -> String {
        posix_join(base, relative)
    }
}

impl Drop for RemoteTransport {
    fn drop(&mut self) {
        // SFTP channel first, then the session itself
        drop(self.sftp.take());
        match self.session.disconnect(None, "sync finished", None) {
            Ok(()) => debug!("closed session to {}", self.label),
            Err(e) => debug!("closing session to {} failed: {}", self.label, e),
        }
    }
}
