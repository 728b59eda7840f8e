#![forbid(unsafe_code)]

//! Scratch alignment over rectangular groups of pane columns.
//!
//! A [`Strip`] is a set of equally long row columns plus the block partition
//! over those rows. Engine operations slice strips out of the live panes,
//! align them here, and commit the result in one transaction.
//!
//! # Alignment
//!
//! [`auto_align`] matches the last column of the left strip against the first
//! column of the right strip. The matched runs split both sides into
//! alternating gap and matched-line segments; each segment pair is emitted
//! top-aligned, and the shorter side is padded with spacers.
//!
//! ```text
//!   left     right           left     right
//!   a        a               a        a
//!   b        x       ──►     b        x
//!   c        c               ·        y      (· = spacer)
//!            y               c        c
//! ```
//!
//! A block boundary is placed wherever either side crosses one of its own
//! block boundaries, so independently aligned regions stay separate.

use std::ops::Range;

use tracing::trace;

use crate::blocks::{block_ranges, block_sum, make_block};
use crate::buffer::LineBuffer;
use crate::matcher::{SequenceMatcher, sanitize};
use crate::row::{Line, Row, spacers};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Strip {
    pub(crate) columns: Vec<Vec<Row>>,
    pub(crate) blocks: Vec<usize>,
}

impl Strip {
    /// `width` empty columns.
    pub(crate) fn with_width(width: usize) -> Self {
        Self {
            columns: vec![Vec::new(); width],
            blocks: Vec::new(),
        }
    }

    /// One column forming a single block.
    pub(crate) fn single(column: Vec<Row>) -> Self {
        Self {
            blocks: make_block(column.len()),
            columns: vec![column],
        }
    }

    /// Rows `range` of every pane in `panes`, partitioned by `blocks`.
    pub(crate) fn from_panes(panes: &[LineBuffer], range: Range<usize>, blocks: Vec<usize>) -> Self {
        Self {
            columns: panes
                .iter()
                .map(|pane| pane.rows()[range.clone()].to_vec())
                .collect(),
            blocks,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn rows(&self) -> usize {
        self.columns
            .first()
            .map_or_else(|| block_sum(&self.blocks), Vec::len)
    }

    /// A lone column has nothing it was aligned against, so its internal
    /// block structure carries no information.
    pub(crate) fn flatten_if_single(mut self) -> Self {
        if self.width() == 1 {
            self.blocks = make_block(self.rows());
        }
        self
    }

    /// Drop rows where every column holds a spacer, shrinking the blocks
    /// that contained them. Blocks that become empty disappear.
    pub(crate) fn remove_null_rows(self) -> Self {
        let mut out = Self::with_width(self.width());
        for range in block_ranges(&self.blocks) {
            let mut kept = 0;
            for row in range {
                if self.columns.iter().any(|column| column[row].is_content()) {
                    for (dst, src) in out.columns.iter_mut().zip(&self.columns) {
                        dst.push(src[row].clone());
                    }
                    kept += 1;
                }
            }
            if kept > 0 {
                out.blocks.push(kept);
            }
        }
        out
    }

    /// Append `other` below this strip. Both must have the same width.
    pub(crate) fn extend(&mut self, other: Strip) {
        debug_assert_eq!(self.width(), other.width());
        for (dst, src) in self.columns.iter_mut().zip(other.columns) {
            dst.extend(src);
        }
        self.blocks.extend(other.blocks);
    }

    /// Concatenate strips top to bottom.
    pub(crate) fn concat(width: usize, parts: impl IntoIterator<Item = Strip>) -> Self {
        let mut out = Self::with_width(width);
        for part in parts {
            out.extend(part);
        }
        out
    }
}

/// Walks one column, handing out the rows that lead up to a given count of
/// content rows.
struct Cursor<'a> {
    column: &'a [Row],
    at: usize,
    seen: usize,
}

impl<'a> Cursor<'a> {
    fn new(column: &'a [Row]) -> Self {
        Self {
            column,
            at: 0,
            seen: 0,
        }
    }

    /// Consume rows until `goal` content rows have been passed, then any
    /// spacers that follow. Returns the consumed row range.
    fn advance_to(&mut self, goal: usize) -> Range<usize> {
        let start = self.at;
        while self.seen < goal && self.at < self.column.len() {
            if self.column[self.at].is_content() {
                self.seen += 1;
            }
            self.at += 1;
        }
        while self.at < self.column.len() && self.column[self.at].is_spacer() {
            self.at += 1;
        }
        start..self.at
    }
}

/// Block index of every row, `None` where `blocks` runs short.
fn row_block_ids(blocks: &[usize], rows: usize) -> Vec<Option<usize>> {
    let mut ids = Vec::with_capacity(rows);
    for (id, range) in block_ranges(blocks).enumerate() {
        ids.extend(range.map(|_| Some(id)));
    }
    ids.resize(rows, None);
    ids
}

/// Tracks which source block each output row came from and emits a block
/// boundary whenever either side moves to a different source block.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<usize>,
    run: usize,
    last_left: Option<usize>,
    last_right: Option<usize>,
}

impl BlockBuilder {
    fn push(&mut self, left: Option<usize>, right: Option<usize>) {
        let crosses = |last: Option<usize>, next: Option<usize>| {
            matches!((last, next), (Some(a), Some(b)) if a != b)
        };
        if crosses(self.last_left, left) || crosses(self.last_right, right) {
            self.blocks.push(self.run);
            self.run = 0;
        }
        self.last_left = left.or(self.last_left);
        self.last_right = right.or(self.last_right);
        self.run += 1;
    }

    fn finish(mut self) -> Vec<usize> {
        if self.run > 0 {
            self.blocks.push(self.run);
        }
        self.blocks
    }
}

fn compare_keys(column: &[Row]) -> Vec<&str> {
    column.iter().filter_map(Row::as_line).map(Line::display).collect()
}

/// Align `left` against `right`, producing a strip of both widths side by
/// side.
pub(crate) fn auto_align(left: Strip, right: Strip, matcher: &dyn SequenceMatcher) -> Strip {
    if left.width() == 0 {
        return right;
    }
    if right.width() == 0 {
        return left;
    }
    let left_width = left.width();
    let width = left_width + right.width();
    let left_ids = row_block_ids(&left.blocks, left.rows());
    let right_ids = row_block_ids(&right.blocks, right.rows());

    let c_left = &left.columns[left_width - 1];
    let c_right = &right.columns[0];
    let keys_left = compare_keys(c_left);
    let keys_right = compare_keys(c_right);
    let runs = sanitize(
        matcher.matches(&keys_left, &keys_right),
        keys_left.len(),
        keys_right.len(),
    );
    trace!(
        left_rows = c_left.len(),
        right_rows = c_right.len(),
        runs = runs.len() - 1,
        "auto align"
    );

    let mut out = Strip::with_width(width);
    let mut builder = BlockBuilder::default();
    let mut cur_left = Cursor::new(c_left);
    let mut cur_right = Cursor::new(c_right);

    for run in &runs {
        for k in 0..=run.len {
            let l = cur_left.advance_to(run.left + k);
            let r = cur_right.advance_to(run.right + k);
            let height = l.len().max(r.len());

            let (out_left, out_right) = out.columns.split_at_mut(left_width);
            for (dst, src) in out_left.iter_mut().zip(&left.columns) {
                dst.extend_from_slice(&src[l.clone()]);
                dst.extend(spacers(height - l.len()));
            }
            for (dst, src) in out_right.iter_mut().zip(&right.columns) {
                dst.extend_from_slice(&src[r.clone()]);
                dst.extend(spacers(height - r.len()));
            }
            for h in 0..height {
                let id_left = (h < l.len()).then(|| left_ids[l.start + h]).flatten();
                let id_right = (h < r.len()).then(|| right_ids[r.start + h]).flatten();
                builder.push(id_left, id_right);
            }
        }
    }

    out.blocks = builder.finish();
    out
}

/// Align a middle strip against optional neighbours on either side.
///
/// Neighbour strips with a single column have their blocks collapsed and all
/// neighbours lose their spacer-only rows before alignment.
pub(crate) fn auto_align3(
    left: Strip,
    mid: Strip,
    right: Strip,
    matcher: &dyn SequenceMatcher,
) -> Strip {
    let mut mid = mid;
    if left.width() > 0 {
        let left = left.flatten_if_single().remove_null_rows();
        mid = auto_align(left, mid, matcher);
    }
    if right.width() > 0 {
        let right = right.flatten_if_single().remove_null_rows();
        mid = auto_align(mid, right, matcher);
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DiffMatcher;

    fn col(lines: &[&str]) -> Vec<Row> {
        lines
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if *s == "." {
                    Row::Spacer
                } else {
                    Row::line(*s, i)
                }
            })
            .collect()
    }

    fn render(strip: &Strip) -> Vec<String> {
        (0..strip.rows())
            .map(|r| {
                strip
                    .columns
                    .iter()
                    .map(|c| match &c[r] {
                        Row::Spacer => ".".to_owned(),
                        row => row.display().to_owned(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    #[test]
    fn pads_the_shorter_side_of_each_gap() {
        let left = Strip::single(col(&["a", "b", "c"]));
        let right = Strip::single(col(&["a", "x", "c", "y"]));
        let out = auto_align(left, right, &DiffMatcher::default());
        assert_eq!(render(&out), vec!["a a", "b x", "c c", ". y"]);
        assert_eq!(out.blocks, vec![4]);
    }

    #[test]
    fn insertions_on_the_left_get_right_spacers() {
        let left = Strip::single(col(&["a", "n1", "n2", "b"]));
        let right = Strip::single(col(&["a", "b"]));
        let out = auto_align(left, right, &DiffMatcher::default());
        assert_eq!(render(&out), vec!["a a", "n1 .", "n2 .", "b b"]);
    }

    #[test]
    fn existing_spacers_are_reused() {
        // Left strip already has two columns with a spacer in the last one.
        let left = Strip {
            columns: vec![col(&["a", "q", "b"]), col(&["a", ".", "b"])],
            blocks: vec![3],
        };
        let right = Strip::single(col(&["a", "b"]));
        let out = auto_align(left, right, &DiffMatcher::default());
        assert_eq!(render(&out), vec!["a a a", "q . .", "b b b"]);
    }

    #[test]
    fn block_boundaries_on_either_side_survive() {
        let left = Strip {
            columns: vec![col(&["a", "b", "c", "d"])],
            blocks: vec![2, 2],
        };
        let right = Strip::single(col(&["a", "b", "c", "d"]));
        let out = auto_align(left, right, &DiffMatcher::default());
        assert_eq!(out.blocks, vec![2, 2]);
        assert_eq!(out.rows(), 4);
    }

    #[test]
    fn empty_sides_produce_spacer_padding() {
        let left = Strip::with_width(2);
        let right = Strip::single(col(&["x", "y"]));
        let out = auto_align(left, right, &DiffMatcher::default());
        assert_eq!(render(&out), vec![". . x", ". . y"]);
        assert_eq!(out.blocks, vec![2]);
    }

    #[test]
    fn remove_null_rows_shrinks_blocks() {
        let strip = Strip {
            columns: vec![col(&["a", ".", ".", "b", "."]), col(&["a", ".", "c", ".", "."])],
            blocks: vec![2, 1, 2],
        };
        let out = strip.remove_null_rows();
        assert_eq!(render(&out), vec!["a a", ". c", "b ."]);
        assert_eq!(out.blocks, vec![1, 1, 1]);
    }

    #[test]
    fn remove_null_rows_without_columns_empties_blocks() {
        let strip = Strip {
            columns: Vec::new(),
            blocks: vec![3, 1],
        };
        let out = strip.remove_null_rows();
        assert!(out.blocks.is_empty());
        assert_eq!(out.rows(), 0);
    }

    #[test]
    fn three_way_alignment_keeps_column_order() {
        let left = Strip::single(col(&["a", "b"]));
        let mid = Strip::single(col(&["a", "m", "b"]));
        let right = Strip::single(col(&["a", "b", "z"]));
        let out = auto_align3(left, mid, right, &DiffMatcher::default());
        assert_eq!(render(&out), vec!["a a a", ". m .", "b b b", ". . z"]);
        assert_eq!(out.blocks, vec![4]);
    }

    #[test]
    fn concat_stacks_parts() {
        let out = Strip::concat(
            1,
            [Strip::single(col(&["a"])), Strip::single(col(&["b", "c"]))],
        );
        assert_eq!(out.rows(), 3);
        assert_eq!(out.blocks, vec![1, 2]);
    }
}
