#![forbid(unsafe_code)]

//! Block partition helpers.
//!
//! A block partition is a sequence of positive run lengths whose sum is the
//! row count. Each run marks rows whose alignment was computed together.

/// A partition holding one block of `n` rows, or no blocks when `n == 0`.
#[must_use]
pub fn make_block(n: usize) -> Vec<usize> {
    if n == 0 { Vec::new() } else { vec![n] }
}

/// Total number of rows covered by `blocks`.
#[must_use]
pub fn block_sum(blocks: &[usize]) -> usize {
    blocks.iter().sum()
}

/// The three partitions produced by [`cut_blocks`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockCut {
    /// Blocks covering `[0, i0)`.
    pub pre: Vec<usize>,
    /// Blocks covering `[i0, i1)`.
    pub mid: Vec<usize>,
    /// Blocks covering `[i1, sum)`.
    pub post: Vec<usize>,
}

impl BlockCut {
    /// Reassemble `pre ++ mid ++ post`, with `mid` replaced.
    #[must_use]
    pub fn join(self, mid: Vec<usize>) -> Vec<usize> {
        let mut out = self.pre;
        out.extend(mid);
        out.extend(self.post);
        out
    }
}

/// Split `blocks` at rows `i0` and `i1`, cutting any block that straddles
/// either boundary.
#[must_use]
pub fn cut_blocks(blocks: &[usize], i0: usize, i1: usize) -> BlockCut {
    let mut cut = BlockCut::default();
    let mut at = 0;
    for &block in blocks {
        let mut rest = block;
        if at < i0 {
            let n = rest.min(i0 - at);
            cut.pre.push(n);
            at += n;
            rest -= n;
        }
        if rest > 0 && at < i1 {
            let n = rest.min(i1 - at);
            cut.mid.push(n);
            at += n;
            rest -= n;
        }
        if rest > 0 {
            cut.post.push(rest);
            at += rest;
        }
    }
    cut
}

/// Row range `[start, end)` of every block, in order.
pub(crate) fn block_ranges(blocks: &[usize]) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
    blocks.iter().scan(0usize, |start, &len| {
        let range = *start..*start + len;
        *start += len;
        Some(range)
    })
}

/// True when every block is positive and the partition sums to `rows`.
#[must_use]
pub fn is_valid_partition(blocks: &[usize], rows: usize) -> bool {
    blocks.iter().all(|&b| b > 0) && block_sum(blocks) == rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_block_skips_empty() {
        assert!(make_block(0).is_empty());
        assert_eq!(make_block(4), vec![4]);
    }

    #[test]
    fn cut_inside_single_block() {
        let cut = cut_blocks(&[10], 3, 7);
        assert_eq!(cut.pre, vec![3]);
        assert_eq!(cut.mid, vec![4]);
        assert_eq!(cut.post, vec![3]);
    }

    #[test]
    fn cut_on_existing_boundaries() {
        let cut = cut_blocks(&[2, 3, 4], 2, 5);
        assert_eq!(cut.pre, vec![2]);
        assert_eq!(cut.mid, vec![3]);
        assert_eq!(cut.post, vec![4]);
    }

    #[test]
    fn cut_across_several_blocks() {
        let cut = cut_blocks(&[2, 3, 4, 1], 1, 8);
        assert_eq!(cut.pre, vec![1]);
        assert_eq!(cut.mid, vec![1, 3, 3]);
        assert_eq!(cut.post, vec![1, 1]);
        assert_eq!(cut.join(vec![7]), vec![1, 7, 1, 1]);
    }

    #[test]
    fn empty_range_yields_empty_mid() {
        let cut = cut_blocks(&[5], 2, 2);
        assert_eq!(cut.pre, vec![2]);
        assert!(cut.mid.is_empty());
        assert_eq!(cut.post, vec![3]);
    }

    #[test]
    fn ranges_follow_partition() {
        let ranges: Vec<_> = block_ranges(&[2, 1, 3]).collect();
        assert_eq!(ranges, vec![0..2, 2..3, 3..6]);
    }

    #[test]
    fn partition_validity() {
        assert!(is_valid_partition(&[1, 2], 3));
        assert!(!is_valid_partition(&[1, 0, 2], 3));
        assert!(!is_valid_partition(&[1, 2], 4));
        assert!(is_valid_partition(&[], 0));
    }
}
