#![forbid(unsafe_code)]

//! The multi-pane alignment engine.
//!
//! [`AlignmentEngine`] owns every pane's [`LineBuffer`] and the shared block
//! partition. Each public operation validates its arguments, computes the
//! new rows and blocks in scratch [`Strip`]s, and only then commits them as
//! one grouped step of the undo log.
//!
//! # Invariants
//!
//! 1. Every pane has exactly [`row_count`](AlignmentEngine::row_count) rows.
//! 2. The block partition is positive and sums to the row count.
//! 3. Undoing a step restores a state where (1) and (2) hold.
//!
//! # Failure Modes
//!
//! - **Bad indices**: rejected with [`AlignError`] before anything changes.
//! - **Unreadable or undecodable source**: `load` fails before touching any
//!   pane, so no partial reload is ever visible.
//! - **Undo with an open block**: a caller bug; the log panics.

mod command;
mod strip;

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use panesync_runtime::{ChangeNotifier, TransactionLog};
use tracing::{debug, debug_span, trace};

use crate::blocks::{block_ranges, block_sum, cut_blocks, make_block};
use crate::buffer::{FileInfo, LineBuffer, PaneId, PanesDelta};
use crate::config::EngineConfig;
use crate::decode::{EncodingRsDecoder, TextDecoder, split_lines};
use crate::error::{AlignError, Result};
use crate::matcher::{DiffMatcher, SequenceMatcher, sanitize};
use crate::row::{Line, Row, spacers};
use crate::source::{FsReader, SourceReader, SourceStamp};

use command::{AlignCommand, EngineState};
use strip::{Strip, auto_align, auto_align3};

/// Rows of the loaded pane that replace old rows up to `end`.
struct Segment {
    end: usize,
    content: Vec<Row>,
}

/// Row-alignment engine over N panes.
pub struct AlignmentEngine {
    state: EngineState,
    log: TransactionLog<AlignCommand>,
    matcher: Box<dyn SequenceMatcher>,
    reader: Box<dyn SourceReader>,
    decoder: Box<dyn TextDecoder>,
    config: EngineConfig,
    next_pane_id: u64,
}

impl fmt::Debug for AlignmentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentEngine")
            .field("state", &self.state)
            .field("log", &self.log)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AlignmentEngine {
    /// An engine with `panes` empty panes and the default configuration.
    #[must_use]
    pub fn new(panes: usize) -> Self {
        Self::with_config(panes, EngineConfig::default())
    }

    /// An engine with `panes` empty panes.
    ///
    /// Undo recording starts disabled so setup (typically the first loads)
    /// is not undoable; call [`enable_undo`](Self::enable_undo) afterwards.
    #[must_use]
    pub fn with_config(panes: usize, config: EngineConfig) -> Self {
        let mut engine = Self {
            state: EngineState {
                panes: Vec::with_capacity(panes),
                blocks: Vec::new(),
                panes_changed: ChangeNotifier::new(),
            },
            log: TransactionLog::new(config.history),
            matcher: Box::new(DiffMatcher::new(config.algorithm)),
            reader: Box::new(FsReader),
            decoder: Box::new(EncodingRsDecoder),
            config,
            next_pane_id: 0,
        };
        for _ in 0..panes {
            let buffer = engine.new_buffer();
            engine.state.panes.push(buffer);
        }
        engine
    }

    /// Replace the sequence matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: impl SequenceMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Replace the source reader used by `load`.
    #[must_use]
    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// Replace the text decoder used by `load`.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl TextDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    // ========================================================================
    // Read access
    // ========================================================================

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.state.panes.len()
    }

    /// Common row count of every pane (the sum of the block partition).
    #[must_use]
    pub fn row_count(&self) -> usize {
        block_sum(&self.state.blocks)
    }

    #[must_use]
    pub fn blocks(&self) -> &[usize] {
        &self.state.blocks
    }

    #[must_use]
    pub fn panes(&self) -> &[LineBuffer] {
        &self.state.panes
    }

    pub fn pane(&self, pane: usize) -> Result<&LineBuffer> {
        self.check_pane(pane)?;
        Ok(&self.state.panes[pane])
    }

    /// Display string of one row of one pane; "" for spacers.
    pub fn text(&self, pane: usize, row: usize) -> Result<&str> {
        self.check_pane(pane)?;
        self.check_rows(row, row.saturating_add(1))?;
        Ok(self.state.panes[pane].rows()[row].display())
    }

    /// Copy of every pane's rows.
    #[must_use]
    pub fn rows_snapshot(&self) -> Vec<Vec<Row>> {
        self.state
            .panes
            .iter()
            .map(|pane| pane.rows().to_vec())
            .collect()
    }

    /// Emits a [`PanesDelta`] whenever panes are inserted, removed, or
    /// swapped (including by undo and redo).
    #[must_use]
    pub fn panes_changed(&self) -> &ChangeNotifier<PanesDelta> {
        &self.state.panes_changed
    }

    // ========================================================================
    // Undo log
    // ========================================================================

    /// Start recording operations for undo.
    pub fn enable_undo(&mut self) {
        self.log.enable();
    }

    /// Group the following operations into one undo step.
    pub fn begin_block(&mut self) {
        self.log.begin_block();
    }

    pub fn end_block(&mut self) {
        self.log.end_block();
    }

    /// Revert the last step. Returns false when there is nothing to undo.
    ///
    /// # Panics
    ///
    /// Panics if a block is open.
    pub fn undo(&mut self) -> bool {
        self.log.undo(&mut self.state)
    }

    /// Re-apply the last undone step. Returns false when there is nothing to
    /// redo.
    ///
    /// # Panics
    ///
    /// Panics if a block is open.
    pub fn redo(&mut self) -> bool {
        self.log.redo(&mut self.state)
    }

    /// Forget all undo and redo history.
    ///
    /// # Panics
    ///
    /// Panics if a block is open.
    pub fn clear_undo(&mut self) {
        self.log.clear();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    // ========================================================================
    // Pane structure
    // ========================================================================

    /// Insert an empty pane at `pane`, filled with spacer rows.
    pub fn insert_pane(&mut self, pane: usize) -> Result<()> {
        let count = self.pane_count();
        if pane > count {
            return Err(AlignError::PaneOutOfRange { pane, count });
        }
        let buffer = self.new_buffer();
        debug!(pane, id = buffer.id().get(), rows = buffer.len(), "insert pane");
        self.apply(AlignCommand::Panes {
            index: pane,
            live: 0,
            stash: vec![buffer],
        });
        Ok(())
    }

    /// Remove the pane at `pane`, along with rows that only it filled.
    pub fn remove_pane(&mut self, pane: usize) -> Result<()> {
        self.check_pane(pane)?;
        debug!(pane, "remove pane");
        self.log.begin_block();
        self.apply(AlignCommand::Panes {
            index: pane,
            live: 1,
            stash: Vec::new(),
        });
        let rows = self.row_count();
        let compact = self.strip(0..self.pane_count(), 0..rows).remove_null_rows();
        if compact.rows() != rows {
            trace!(from = rows, to = compact.rows(), "drop spacer-only rows");
            let blocks = compact.blocks.clone();
            self.commit(0..rows, compact, blocks);
        }
        self.log.end_block();
        Ok(())
    }

    /// Exchange the panes at `a` and `b`.
    pub fn swap_panes(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_pane(a)?;
        self.check_pane(b)?;
        if a == b {
            return Ok(());
        }
        debug!(a, b, "swap panes");
        self.apply(AlignCommand::SwapPanes { a, b });
        Ok(())
    }

    // ========================================================================
    // Alignment
    // ========================================================================

    /// Replace rows `[i0, i1)` of `pane` with `rows` and realign the other
    /// panes against them within that range.
    pub fn replace_range(&mut self, pane: usize, i0: usize, i1: usize, rows: Vec<Row>) -> Result<()> {
        self.check_pane(pane)?;
        self.check_rows(i0, i1)?;
        debug!(pane, i0, i1, new_rows = rows.len(), "replace range");

        let cut = cut_blocks(&self.state.blocks, i0, i1);
        let count = self.pane_count();
        let left = self.strip(0..pane, i0..i1);
        let right = self.strip(pane + 1..count, i0..i1);
        let merged = auto_align3(left, Strip::single(rows), right, self.matcher.as_ref());

        let blocks = cut.join(merged.blocks.clone());
        self.grouped(|engine| engine.commit(i0..i1, merged, blocks));
        Ok(())
    }

    /// Split rows `[i0, i1)` into two blocks: first the content rows of
    /// `pane` alone, then the other panes' rows with `pane` blanked.
    ///
    /// Does nothing with fewer than two panes.
    pub fn isolate(&mut self, pane: usize, i0: usize, i1: usize) -> Result<()> {
        self.check_pane(pane)?;
        self.check_rows(i0, i1)?;
        let count = self.pane_count();
        if count < 2 {
            return Ok(());
        }
        debug!(pane, i0, i1, "isolate");

        let cut = cut_blocks(&self.state.blocks, i0, i1);
        let isolated: Vec<Row> = self.state.panes[pane].rows()[i0..i1]
            .iter()
            .filter(|row| row.is_content())
            .cloned()
            .collect();
        let n = isolated.len();

        let others: Vec<Vec<Row>> = (0..count)
            .filter(|&p| p != pane)
            .map(|p| self.state.panes[p].rows()[i0..i1].to_vec())
            .collect();
        let rest = Strip {
            columns: others,
            blocks: cut.mid.clone(),
        }
        .flatten_if_single()
        .remove_null_rows();
        let rest_rows = rest.rows();

        let mut rest_columns = rest.columns.into_iter();
        let columns: Vec<Vec<Row>> = (0..count)
            .map(|p| {
                if p == pane {
                    let mut column = isolated.clone();
                    column.extend(spacers(rest_rows));
                    column
                } else {
                    let mut column: Vec<Row> = spacers(n).collect();
                    column.extend(rest_columns.next().unwrap_or_default());
                    column
                }
            })
            .collect();

        let mut mid = make_block(n);
        mid.extend(rest.blocks);
        let blocks = cut.join(mid);
        let merged = Strip {
            columns,
            blocks: Vec::new(),
        };
        self.grouped(|engine| engine.commit(i0..i1, merged, blocks));
        Ok(())
    }

    /// Treat `[i0_left, i1_left)` of panes `0..=split` and
    /// `[i0_right, i1_right)` of the remaining panes as corresponding, and
    /// realign the spanned rows accordingly.
    ///
    /// The spanned range `[min(i0), max(i1))` is cut out of the partition;
    /// each side is divided into the rows before, inside, and after its
    /// range, and the three pairs are aligned independently.
    pub fn manual_align(
        &mut self,
        split: usize,
        i0_left: usize,
        i1_left: usize,
        i0_right: usize,
        i1_right: usize,
    ) -> Result<()> {
        let count = self.pane_count();
        if split + 1 >= count {
            return Err(AlignError::InvalidSplit { split, count });
        }
        self.check_rows(i0_left, i1_left)?;
        self.check_rows(i0_right, i1_right)?;
        let start = i0_left.min(i0_right);
        let end = i1_left.max(i1_right);
        debug!(split, i0_left, i1_left, i0_right, i1_right, "manual align");

        let cut = cut_blocks(&self.state.blocks, start, end);
        let left = self.side_parts(0..split + 1, start, end, i0_left, i1_left, &cut.mid);
        let right = self.side_parts(split + 1..count, start, end, i0_right, i1_right, &cut.mid);

        let matcher = self.matcher.as_ref();
        let parts: Vec<Strip> = left
            .into_iter()
            .zip(right)
            .map(|(l, r)| auto_align(l, r, matcher))
            .collect();
        let merged = Strip::concat(count, parts);

        let blocks = cut.join(merged.blocks.clone());
        self.grouped(|engine| engine.commit(start..end, merged, blocks));
        Ok(())
    }

    /// Drop spacer rows in `[i0, i1)` and realign every pane there from
    /// scratch, adjacent panes pairwise, into a single block.
    pub fn realign(&mut self, i0: usize, i1: usize) -> Result<()> {
        self.check_rows(i0, i1)?;
        let count = self.pane_count();
        if count == 0 {
            return Ok(());
        }
        debug!(i0, i1, "realign");

        let cut = cut_blocks(&self.state.blocks, i0, i1);
        let lines = |buffer: &LineBuffer| -> Vec<Row> {
            buffer.rows()[i0..i1]
                .iter()
                .filter(|row| row.is_content())
                .cloned()
                .collect()
        };
        let matcher = self.matcher.as_ref();
        let merged = self
            .state
            .panes
            .iter()
            .map(|buffer| Strip::single(lines(buffer)))
            .reduce(|acc, next| auto_align(acc, next, matcher))
            .unwrap_or_default();

        let blocks = cut.join(merged.blocks.clone());
        self.grouped(|engine| engine.commit(i0..i1, merged, blocks));
        Ok(())
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Set or clear the edit overlay on one row.
    ///
    /// Editing a spacer row creates a line with no committed text; clearing
    /// the overlay of such a line turns it back into a spacer.
    pub fn set_edit(&mut self, pane: usize, row: usize, edit: Option<&str>) -> Result<()> {
        self.check_pane(pane)?;
        self.check_rows(row, row.saturating_add(1))?;
        let edit: Option<Rc<str>> = edit.map(Rc::from);
        let replacement = match (&self.state.panes[pane].rows()[row], edit) {
            (Row::Spacer, None) => return Ok(()),
            (Row::Spacer, Some(edit)) => Row::Content(Line::synthesized(edit)),
            (Row::Content(line), None) if line.text().is_none() => Row::Spacer,
            (Row::Content(line), edit) => Row::Content(line.with_edit(edit)),
        };
        debug!(pane, row, spacer = replacement.is_spacer(), "set edit");
        self.set_contents(pane, row..row + 1, vec![replacement]);
        Ok(())
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load `path` into `pane`, trying the configured encodings in order.
    pub fn load(&mut self, pane: usize, path: impl AsRef<Path>, is_reload: bool) -> Result<()> {
        let encodings = self.config.encodings.clone();
        self.load_with_encodings(pane, path, &encodings, is_reload)
    }

    /// Load `path` into `pane`, trying `encodings` in order.
    ///
    /// A fresh load aligns the new content as one segment against the other
    /// panes. A reload diffs the pane's committed text against the new
    /// content and keeps every old block boundary that falls inside or on the
    /// edge of a matched run, so only the changed regions are realigned.
    pub fn load_with_encodings<S: AsRef<str>>(
        &mut self,
        pane: usize,
        path: impl AsRef<Path>,
        encodings: &[S],
        is_reload: bool,
    ) -> Result<()> {
        self.check_pane(pane)?;
        let path = path.as_ref();
        let _span = debug_span!("load", pane, path = %path.display(), is_reload).entered();

        let data = self.reader.read(path).map_err(|source| AlignError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (encoding, text) = self.decode(path, &data.bytes, encodings)?;
        let lines: Vec<Row> = split_lines(&text)
            .into_iter()
            .enumerate()
            .map(|(i, line)| Row::line(line, i))
            .collect();
        debug!(lines = lines.len(), encoding = %encoding, "decoded");

        let rows = self.row_count();
        let segments = if is_reload {
            self.reload_segments(pane, lines)
        } else {
            vec![Segment {
                end: rows,
                content: lines,
            }]
        };
        debug!(segments = segments.len(), "aligning");
        let merged = self.align_segments(pane, segments);
        let blocks = merged.blocks.clone();

        let info = FileInfo {
            path: Some(path.to_path_buf()),
            encoding: Some(encoding),
        };
        self.grouped(|engine| {
            engine.apply(AlignCommand::FileInfo { pane, stash: info });
            engine.commit(0..rows, merged, blocks);
        });
        self.state.panes[pane].mark_committed(data.stamp);
        Ok(())
    }

    /// Record that `pane`'s live content was written out with `stamp`.
    pub fn mark_saved(&mut self, pane: usize, stamp: SourceStamp) -> Result<()> {
        self.check_pane(pane)?;
        debug!(pane, "mark saved");
        self.state.panes[pane].mark_committed(stamp);
        Ok(())
    }

    /// Probe `pane`'s source and report whether it changed on disk since it
    /// was loaded or saved. Panes without a path report `false`.
    pub fn refresh_stamp(&mut self, pane: usize) -> Result<bool> {
        self.check_pane(pane)?;
        let Some(path) = self.state.panes[pane].path().map(Path::to_path_buf) else {
            return Ok(false);
        };
        let stamp = self.reader.stamp(&path).map_err(|source| AlignError::Io {
            path: path.clone(),
            source,
        })?;
        let buffer = &mut self.state.panes[pane];
        buffer.set_last_stamp(stamp);
        let changed = buffer.changed_on_disk();
        debug!(pane, changed, "refresh stamp");
        Ok(changed)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn new_buffer(&mut self) -> LineBuffer {
        let id = PaneId(self.next_pane_id);
        self.next_pane_id += 1;
        LineBuffer::new(id, self.row_count())
    }

    fn check_pane(&self, pane: usize) -> Result<()> {
        let count = self.pane_count();
        if pane < count {
            Ok(())
        } else {
            Err(AlignError::PaneOutOfRange { pane, count })
        }
    }

    fn check_rows(&self, start: usize, end: usize) -> Result<()> {
        let count = self.row_count();
        if start <= end && end <= count {
            Ok(())
        } else {
            Err(AlignError::RowsOutOfRange { start, end, count })
        }
    }

    /// Rows `range` of panes `panes`, with no blocks assigned yet.
    fn strip(&self, panes: std::ops::Range<usize>, range: std::ops::Range<usize>) -> Strip {
        let blocks = cut_blocks(&self.state.blocks, range.start, range.end).mid;
        Strip::from_panes(&self.state.panes[panes], range, blocks)
    }

    /// One side of a manual alignment, as the before/inside/after strips of
    /// `[i0, i1)` within the spanned rows `[start, end)`, spacer rows removed.
    fn side_parts(
        &self,
        panes: std::ops::Range<usize>,
        start: usize,
        end: usize,
        i0: usize,
        i1: usize,
        mid: &[usize],
    ) -> [Strip; 3] {
        let inner = cut_blocks(mid, i0 - start, i1 - start);
        [
            (start..i0, inner.pre),
            (i0..i1, inner.mid),
            (i1..end, inner.post),
        ]
        .map(|(range, blocks)| {
            Strip::from_panes(&self.state.panes[panes.clone()], range, blocks)
                .flatten_if_single()
                .remove_null_rows()
        })
    }

    fn decode<S: AsRef<str>>(&self, path: &Path, bytes: &[u8], encodings: &[S]) -> Result<(String, String)> {
        for label in encodings {
            let label = label.as_ref();
            match self.decoder.decode(bytes, label) {
                Ok(text) => return Ok((label.to_owned(), text)),
                Err(err) => trace!(label, %err, "decode attempt failed"),
            }
        }
        Err(AlignError::Decode {
            path: path.to_path_buf(),
            tried: encodings.iter().map(|s| s.as_ref().to_owned()).collect(),
        })
    }

    /// Split freshly read `lines` into segments ending at old block starts
    /// that fall inside or on the edge of a run matched against the
    /// committed text.
    fn reload_segments(&self, pane: usize, lines: Vec<Row>) -> Vec<Segment> {
        let old = self.state.panes[pane].rows();
        // Lines typed into spacer rows were never read from the source.
        fn committed(rows: &[Row]) -> Vec<&str> {
            rows.iter()
                .filter_map(Row::as_line)
                .filter_map(Line::text)
                .collect()
        }
        let old_keys = committed(old);
        let new_keys: Vec<&str> = lines.iter().map(Row::display).collect();
        let runs = sanitize(
            self.matcher.matches(&old_keys, &new_keys),
            old_keys.len(),
            new_keys.len(),
        );

        // (old row where a block starts, index of the new line it maps to)
        let mut cuts: Vec<(usize, usize)> = Vec::new();
        let mut ranges = block_ranges(&self.state.blocks);
        let mut seen = 0;
        for run in runs.iter().filter(|run| run.len > 0) {
            let matched_end = run.left + run.len;
            while seen <= matched_end {
                let Some(range) = ranges.next() else { break };
                let before = seen;
                let start = range.start;
                seen += committed(&old[range]).len();
                if run.left <= before && before <= matched_end && before > 0 {
                    cuts.push((start, run.right + before - run.left));
                }
            }
        }
        trace!(cuts = cuts.len(), "reload reuses block boundaries");

        let mut lines = lines.into_iter();
        let mut taken = 0;
        let mut segments = Vec::with_capacity(cuts.len() + 1);
        for (end, index) in cuts {
            segments.push(Segment {
                end,
                content: lines.by_ref().take(index - taken).collect(),
            });
            taken = index;
        }
        segments.push(Segment {
            end: self.row_count(),
            content: lines.collect(),
        });
        segments
    }

    /// Align each segment's new content for `pane` against the other panes'
    /// rows in the old range it replaces.
    fn align_segments(&self, pane: usize, segments: Vec<Segment>) -> Strip {
        let count = self.pane_count();
        let blocks = &self.state.blocks;
        let mut out = Strip::with_width(count);
        let (mut start, mut next_block) = (0, 0);
        for segment in segments {
            let first_block = next_block;
            let mut end = start;
            while end < segment.end {
                let Some(&len) = blocks.get(next_block) else { break };
                end += len;
                next_block += 1;
            }
            let seg_blocks = blocks[first_block..next_block].to_vec();
            let left = Strip::from_panes(&self.state.panes[..pane], start..end, seg_blocks.clone());
            let right = Strip::from_panes(&self.state.panes[pane + 1..], start..end, seg_blocks);
            let merged = auto_align3(left, Strip::single(segment.content), right, self.matcher.as_ref());
            trace!(start, end, rows = merged.rows(), "aligned segment");
            out.extend(merged);
            start = end;
        }
        out
    }

    fn apply(&mut self, cmd: AlignCommand) {
        self.log.apply(cmd, &mut self.state);
    }

    /// Run `f` inside one undo block.
    fn grouped(&mut self, f: impl FnOnce(&mut Self)) {
        self.log.begin_block();
        f(self);
        self.log.end_block();
    }

    /// Replace rows `range` of `pane`. The pane gets a fresh version only
    /// when its lines change; moving spacers around keeps the version.
    fn set_contents(&mut self, pane: usize, range: std::ops::Range<usize>, rows: Vec<Row>) {
        let buffer = &mut self.state.panes[pane];
        let old_lines = buffer.rows()[range.clone()].iter().filter_map(Row::as_line);
        let version = if old_lines.eq(rows.iter().filter_map(Row::as_line)) {
            buffer.current_version()
        } else {
            buffer.allocate_version()
        };
        self.apply(AlignCommand::Contents {
            pane,
            index: range.start,
            live: range.len(),
            stash: rows,
            stash_version: version,
        });
    }

    /// Write `strip`'s columns over rows `range` of every pane and install
    /// `blocks` as the new partition.
    fn commit(&mut self, range: std::ops::Range<usize>, strip: Strip, blocks: Vec<usize>) {
        debug_assert_eq!(strip.width(), self.pane_count());
        for (pane, column) in strip.columns.into_iter().enumerate() {
            self.set_contents(pane, range.clone(), column);
        }
        let live = self.state.blocks.len();
        self.apply(AlignCommand::Blocks {
            index: 0,
            live,
            stash: blocks,
        });
        debug_assert!(
            self.state
                .panes
                .iter()
                .all(|pane| pane.len() == self.row_count()),
            "pane lengths diverged from the block partition"
        );
    }
}
