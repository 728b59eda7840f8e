#![forbid(unsafe_code)]

//! Row alignment across N text panes.
//!
//! # Key Components
//!
//! - [`AlignmentEngine`] - owns the panes and the block partition; every
//!   operation is one undoable step
//! - [`LineBuffer`] - one pane's rows, file identity, and versions
//! - [`Row`] / [`Line`] - spacer or content row, with an edit overlay
//! - [`SequenceMatcher`] - pairwise matching, [`DiffMatcher`] by default
//! - [`SourceReader`] and [`TextDecoder`] - how `load` gets its text
//!
//! # Example
//!
//! ```
//! use panesync_align::{AlignmentEngine, MemoryReader};
//!
//! let reader = MemoryReader::new();
//! reader.insert("old.txt", "a\nb\nc\n");
//! reader.insert("new.txt", "a\nx\nc\n");
//!
//! let mut engine = AlignmentEngine::new(2).with_reader(reader);
//! engine.load(0, "old.txt", false)?;
//! engine.load(1, "new.txt", false)?;
//! engine.enable_undo();
//!
//! assert_eq!(engine.row_count(), 3);
//! assert_eq!(engine.text(1, 1)?, "x");
//!
//! engine.isolate(1, 1, 2)?;
//! assert_eq!(engine.row_count(), 4);
//! engine.undo();
//! assert_eq!(engine.row_count(), 3);
//! # Ok::<(), panesync_align::AlignError>(())
//! ```

pub mod blocks;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod row;
pub mod source;

pub use blocks::{BlockCut, block_sum, cut_blocks, is_valid_partition, make_block};
pub use buffer::{ContentsDelta, FileInfo, FileInfoDelta, LineBuffer, PaneId, PanesDelta};
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::EngineConfig;
pub use decode::{DecodeError, EncodingRsDecoder, TextDecoder, split_lines};
pub use engine::AlignmentEngine;
pub use error::{AlignError, Result};
pub use matcher::{DiffMatcher, MatchAlgorithm, MatchedRun, SequenceMatcher};
pub use row::{Line, Row};
pub use source::{FsReader, MemoryReader, SourceData, SourceReader, SourceStamp};
