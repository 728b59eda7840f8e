#![forbid(unsafe_code)]

//! Byte sources for pane loading.
//!
//! [`SourceReader`] abstracts "bytes plus a modification signature for a
//! path". [`FsReader`] reads the local filesystem; [`MemoryReader`] serves
//! an in-memory map and is handy for hosts that fetch content elsewhere.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashMap;

/// Modification signature of a source, compared to detect external changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceStamp {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Raw content read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceData {
    pub bytes: Vec<u8>,
    pub stamp: SourceStamp,
}

/// Reads raw bytes and modification signatures by path.
pub trait SourceReader {
    /// Read the whole source at `path`.
    fn read(&self, path: &Path) -> io::Result<SourceData>;

    /// Probe the modification signature without reading content.
    fn stamp(&self, path: &Path) -> io::Result<SourceStamp>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<SourceData> {
        let stamp = self.stamp(path)?;
        let bytes = std::fs::read(path)?;
        Ok(SourceData { bytes, stamp })
    }

    fn stamp(&self, path: &Path) -> io::Result<SourceStamp> {
        let meta = std::fs::metadata(path)?;
        Ok(SourceStamp {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

struct MemoryEntry {
    bytes: Rc<[u8]>,
    revision: u64,
}

/// In-memory sources keyed by path.
///
/// Clones share the same map, so a host can keep one handle to update
/// content while the engine reads through another. Each `insert` bumps a
/// revision that is reported as the modification time.
#[derive(Clone, Default)]
pub struct MemoryReader {
    entries: Rc<RefCell<FxHashMap<PathBuf, MemoryEntry>>>,
    revision: Rc<Cell<u64>>,
}

impl fmt::Debug for MemoryReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryReader")
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}

impl MemoryReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the content at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        let bytes: Vec<u8> = bytes.into();
        self.entries.borrow_mut().insert(
            path.into(),
            MemoryEntry {
                bytes: bytes.into(),
                revision,
            },
        );
    }

    /// Drop the content at `path`; later reads fail with `NotFound`.
    pub fn remove(&self, path: &Path) -> bool {
        self.entries.borrow_mut().remove(path).is_some()
    }

    fn with_entry<R>(&self, path: &Path, f: impl FnOnce(&MemoryEntry) -> R) -> io::Result<R> {
        self.entries
            .borrow()
            .get(path)
            .map(f)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

fn memory_stamp(entry: &MemoryEntry) -> SourceStamp {
    SourceStamp {
        len: entry.bytes.len() as u64,
        modified: Some(SystemTime::UNIX_EPOCH + Duration::from_nanos(entry.revision)),
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<SourceData> {
        self.with_entry(path, |entry| SourceData {
            bytes: entry.bytes.to_vec(),
            stamp: memory_stamp(entry),
        })
    }

    fn stamp(&self, path: &Path) -> io::Result<SourceStamp> {
        self.with_entry(path, memory_stamp)
    }
}
