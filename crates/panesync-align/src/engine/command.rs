#![forbid(unsafe_code)]

//! Reversible edits applied to [`EngineState`] through the undo log.
//!
//! Every command uses swap semantics: it holds whichever side of the change
//! is not currently live. Executing swaps its stash with the live range;
//! undoing swaps it back. Commands hold indices and owned values only.

use std::fmt;

use panesync_runtime::{ChangeNotifier, UndoableCmd};

use crate::buffer::{FileInfo, LineBuffer, PanesDelta};
use crate::row::Row;

/// Everything the undo log may touch.
pub(crate) struct EngineState {
    pub(crate) panes: Vec<LineBuffer>,
    pub(crate) blocks: Vec<usize>,
    pub(crate) panes_changed: ChangeNotifier<PanesDelta>,
}

impl fmt::Debug for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineState")
            .field("panes", &self.panes)
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) enum AlignCommand {
    /// Replace `live` panes at `index` with the stashed panes.
    Panes {
        index: usize,
        live: usize,
        stash: Vec<LineBuffer>,
    },
    /// Exchange the panes at `a` and `b`.
    SwapPanes { a: usize, b: usize },
    /// Replace `live` rows at `index` of one pane, along with its version.
    Contents {
        pane: usize,
        index: usize,
        live: usize,
        stash: Vec<Row>,
        stash_version: u64,
    },
    FileInfo { pane: usize, stash: FileInfo },
    /// Replace `live` entries at `index` of the block partition.
    Blocks {
        index: usize,
        live: usize,
        stash: Vec<usize>,
    },
}

impl AlignCommand {
    fn swap(&mut self, state: &mut EngineState) {
        match self {
            Self::Panes { index, live, stash } => {
                let incoming = std::mem::take(stash);
                let inserted = incoming.iter().map(LineBuffer::id).collect();
                let count = incoming.len();
                *stash = state
                    .panes
                    .splice(*index..*index + *live, incoming)
                    .collect();
                *live = count;
                state.panes_changed.emit(&PanesDelta {
                    index: *index,
                    removed: stash.iter().map(LineBuffer::id).collect(),
                    inserted,
                });
            }
            Self::SwapPanes { a, b } => {
                let (a, b) = (*a, *b);
                state.panes.swap(a, b);
                let (id_a, id_b) = (state.panes[a].id(), state.panes[b].id());
                state.panes_changed.emit(&PanesDelta {
                    index: a,
                    removed: vec![id_b],
                    inserted: vec![id_a],
                });
                state.panes_changed.emit(&PanesDelta {
                    index: b,
                    removed: vec![id_a],
                    inserted: vec![id_b],
                });
            }
            Self::Contents {
                pane,
                index,
                live,
                stash,
                stash_version,
            } => {
                let buffer = &mut state.panes[*pane];
                let incoming = std::mem::take(stash);
                let count = incoming.len();
                buffer.swap_version(stash_version);
                *stash = buffer.replace_rows(*index, *live, incoming);
                *live = count;
            }
            Self::FileInfo { pane, stash } => {
                let incoming = std::mem::take(stash);
                *stash = state.panes[*pane].replace_file_info(incoming);
            }
            Self::Blocks { index, live, stash } => {
                let incoming = std::mem::take(stash);
                let count = incoming.len();
                *stash = state
                    .blocks
                    .splice(*index..*index + *live, incoming)
                    .collect();
                *live = count;
            }
        }
    }
}

impl UndoableCmd for AlignCommand {
    type Target = EngineState;

    fn execute(&mut self, target: &mut EngineState) {
        self.swap(target);
    }

    fn undo(&mut self, target: &mut EngineState) {
        self.swap(target);
    }

    fn description(&self) -> &str {
        match self {
            Self::Panes { .. } => "replace panes",
            Self::SwapPanes { .. } => "swap panes",
            Self::Contents { .. } => "replace rows",
            Self::FileInfo { .. } => "set file info",
            Self::Blocks { .. } => "replace blocks",
        }
    }
}
