#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

/// Errors returned by [`AlignmentEngine`](crate::AlignmentEngine) operations.
///
/// Every error is raised before any state is touched, so a failed call
/// leaves panes, blocks, and the undo log exactly as they were.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("pane {pane} out of range ({count} panes)")]
    PaneOutOfRange { pane: usize, count: usize },

    #[error("rows {start}..{end} out of range ({count} rows)")]
    RowsOutOfRange {
        start: usize,
        end: usize,
        count: usize,
    },

    #[error("split after pane {split} leaves a side empty ({count} panes)")]
    InvalidSplit { split: usize, count: usize },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("none of {tried:?} could decode {}", path.display())]
    Decode { path: PathBuf, tried: Vec<String> },
}

pub type Result<T, E = AlignError> = std::result::Result<T, E>;
