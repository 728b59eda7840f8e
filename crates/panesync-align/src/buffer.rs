#![forbid(unsafe_code)]

//! One pane's rows plus its file identity and version counters.
//!
//! A [`LineBuffer`] is read-only outside this crate. All mutation goes
//! through engine commands so that every change is paired with its inverse
//! in the undo log.
//!
//! # Versions
//!
//! `current_version` identifies the live content. It changes with every
//! content command that alters the pane's lines (moving spacers keeps it),
//! and undo or redo restore the version the content had. `committed_version`
//! is the version last written to or read from disk. New versions come from
//! a per-buffer allocator that undo never rewinds, so a version is never
//! reused for different content.

use std::fmt;
use std::path::Path;

use panesync_runtime::ChangeNotifier;

use crate::row::{Row, spacers};
use crate::source::SourceStamp;

/// Stable identity of a pane, independent of its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(pub(crate) u64);

impl PaneId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane#{}", self.0)
    }
}

/// Where a pane's content came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub path: Option<std::path::PathBuf>,
    pub encoding: Option<String>,
}

/// Rows `[index, index + removed.len())` were replaced by `inserted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentsDelta {
    pub index: usize,
    pub removed: Vec<Row>,
    pub inserted: Vec<Row>,
}

/// The pane's file identity changed from `previous` to `current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfoDelta {
    pub previous: FileInfo,
    pub current: FileInfo,
}

/// Panes `[index, index + removed.len())` were replaced by `inserted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanesDelta {
    pub index: usize,
    pub removed: Vec<PaneId>,
    pub inserted: Vec<PaneId>,
}

/// One pane of the engine.
pub struct LineBuffer {
    id: PaneId,
    rows: Vec<Row>,
    file_info: FileInfo,
    stamp: Option<SourceStamp>,
    last_stamp: Option<SourceStamp>,
    current_version: u64,
    committed_version: u64,
    next_version: u64,
    contents_changed: ChangeNotifier<ContentsDelta>,
    file_info_changed: ChangeNotifier<FileInfoDelta>,
}

impl fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuffer")
            .field("id", &self.id)
            .field("rows", &self.rows.len())
            .field("file_info", &self.file_info)
            .field("current_version", &self.current_version)
            .field("committed_version", &self.committed_version)
            .finish_non_exhaustive()
    }
}

impl LineBuffer {
    /// A buffer of `rows` spacer rows.
    pub(crate) fn new(id: PaneId, rows: usize) -> Self {
        Self {
            id,
            rows: spacers(rows).collect(),
            file_info: FileInfo::default(),
            stamp: None,
            last_stamp: None,
            current_version: 0,
            committed_version: 0,
            next_version: 1,
            contents_changed: ChangeNotifier::new(),
            file_info_changed: ChangeNotifier::new(),
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    #[must_use]
    pub fn id(&self) -> PaneId {
        self.id
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Display string at `index`; "" for spacers, `None` past the end.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(Row::display)
    }

    /// Number of content (non-spacer) rows.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_content()).count()
    }

    #[must_use]
    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file_info.path.as_deref()
    }

    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.file_info.encoding.as_deref()
    }

    /// Signature recorded when the content was last loaded or saved.
    #[must_use]
    pub fn stamp(&self) -> Option<SourceStamp> {
        self.stamp
    }

    /// Most recent signature probed from the source.
    #[must_use]
    pub fn last_stamp(&self) -> Option<SourceStamp> {
        self.last_stamp
    }

    /// True when the source changed on disk since it was loaded or saved.
    #[must_use]
    pub fn changed_on_disk(&self) -> bool {
        self.last_stamp != self.stamp
    }

    #[must_use]
    pub fn current_version(&self) -> u64 {
        self.current_version
    }

    #[must_use]
    pub fn committed_version(&self) -> u64 {
        self.committed_version
    }

    /// True when the live content differs from the committed content.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.current_version != self.committed_version
    }

    /// Emits a [`ContentsDelta`] for every row replacement.
    #[must_use]
    pub fn contents_changed(&self) -> &ChangeNotifier<ContentsDelta> {
        &self.contents_changed
    }

    /// Emits a [`FileInfoDelta`] whenever path or encoding change.
    #[must_use]
    pub fn file_info_changed(&self) -> &ChangeNotifier<FileInfoDelta> {
        &self.file_info_changed
    }

    // ========================================================================
    // Command plumbing
    // ========================================================================

    /// Reserve a fresh version for an upcoming content command.
    pub(crate) fn allocate_version(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }

    /// Exchange the live version with `version`.
    pub(crate) fn swap_version(&mut self, version: &mut u64) {
        std::mem::swap(&mut self.current_version, version);
    }

    /// Replace `len` rows at `index` with `rows`, returning the old rows.
    pub(crate) fn replace_rows(&mut self, index: usize, len: usize, rows: Vec<Row>) -> Vec<Row> {
        let inserted = rows.clone();
        let removed: Vec<Row> = self.rows.splice(index..index + len, rows).collect();
        self.contents_changed.emit(&ContentsDelta {
            index,
            removed: removed.clone(),
            inserted,
        });
        removed
    }

    /// Install `info`, returning the previous file info.
    pub(crate) fn replace_file_info(&mut self, info: FileInfo) -> FileInfo {
        let previous = std::mem::replace(&mut self.file_info, info);
        self.file_info_changed.emit(&FileInfoDelta {
            previous: previous.clone(),
            current: self.file_info.clone(),
        });
        previous
    }

    /// Record that the live content matches the source, as last read or
    /// written with `stamp`.
    pub(crate) fn mark_committed(&mut self, stamp: SourceStamp) {
        self.stamp = Some(stamp);
        self.last_stamp = Some(stamp);
        self.committed_version = self.current_version;
    }

    pub(crate) fn set_last_stamp(&mut self, stamp: SourceStamp) {
        self.last_stamp = Some(stamp);
    }
}
