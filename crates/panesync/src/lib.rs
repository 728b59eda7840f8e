#![forbid(unsafe_code)]

//! panesync public facade crate.
//!
//! Re-exports the alignment engine and its supporting types from the
//! internal crates, plus a small prelude.
//!
//! ```
//! use panesync::prelude::*;
//!
//! let reader = MemoryReader::new();
//! reader.insert("base", "one\ntwo\n");
//! reader.insert("ours", "one\n2\ntwo\n");
//!
//! let mut engine = AlignmentEngine::new(2).with_reader(reader);
//! engine.load(0, "base", false)?;
//! engine.load(1, "ours", false)?;
//! assert_eq!(engine.text(0, 1)?, "");
//! assert_eq!(engine.text(1, 1)?, "2");
//! # Ok::<(), AlignError>(())
//! ```

// --- Engine re-exports -----------------------------------------------------

pub use panesync_align::{
    AlignError, AlignmentEngine, ContentsDelta, EngineConfig, FileInfo, FileInfoDelta, Line,
    LineBuffer, PaneId, PanesDelta, Result, Row,
};

#[cfg(feature = "config")]
pub use panesync_align::ConfigError;

// --- Adapter re-exports ----------------------------------------------------

pub use panesync_align::{
    DecodeError, DiffMatcher, EncodingRsDecoder, FsReader, MatchAlgorithm, MatchedRun,
    MemoryReader, SequenceMatcher, SourceData, SourceReader, SourceStamp, TextDecoder,
};

// --- Runtime and core re-exports -------------------------------------------

pub use panesync_core::{AccumulationCache, IndexedPriorityQueue, Orientation, QueueError};
pub use panesync_runtime::{ChangeNotifier, LogConfig, Subscription, TransactionLog, UndoableCmd};

/// Prelude for day-to-day use.
pub mod prelude {
    pub use crate::{
        AlignError, AlignmentEngine, EngineConfig, MemoryReader, PaneId, Result, Row,
        SourceStamp,
    };

    pub use crate::{align, core, runtime};
}

pub use panesync_align as align;
pub use panesync_core as core;
pub use panesync_runtime as runtime;
