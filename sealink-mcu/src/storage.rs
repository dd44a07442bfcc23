//! Persistent Storage Abstraction
//!
//! The receiver reads exactly one file from flash: its private key. Board
//! crates mount the partition and hand over a [`KeyFs`].

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// A file found on the storage partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
}

/// Trait for read-only access to the key partition
///
/// Paths are absolute within the partition (e.g. `/private.pem`).
pub trait KeyFs {
    /// Read a whole file. `Ok(None)` when it does not exist.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// List files at the partition root
    fn list(&self) -> io::Result<Vec<FileEntry>>;
}

/// A mounted directory (SPIFFS/LittleFS VFS mount, or any host directory)
#[derive(Debug, Clone)]
pub struct StdFs {
    root: PathBuf,
}

impl StdFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl KeyFs for StdFs {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.resolve(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self) -> io::Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_file() {
                entries.push(FileEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    size: meta.len(),
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Files held in memory
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), data.into());
        self
    }
}

impl KeyFs for MemFs {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.files.get(path).cloned())
    }

    fn list(&self) -> io::Result<Vec<FileEntry>> {
        Ok(self
            .files
            .iter()
            .map(|(name, data)| FileEntry {
                name: name.trim_start_matches('/').to_string(),
                size: data.len() as u64,
            })
            .collect())
    }
}

/// Storage that failed to mount; every access errors
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmounted;

impl KeyFs for Unmounted {
    fn read(&self, _path: &str) -> io::Result<Option<Vec<u8>>> {
        Err(io::Error::new(io::ErrorKind::NotConnected, "filesystem not mounted"))
    }

    fn list(&self) -> io::Result<Vec<FileEntry>> {
        Err(io::Error::new(io::ErrorKind::NotConnected, "filesystem not mounted"))
    }
}
