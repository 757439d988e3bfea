//! The range partitioner: splits `[start, start + count)` into ordered,
//! contiguous, non-overlapping ranges, one per block.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::DeltaCodecError;

/// A half-open index range over a column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub inclusive_start: usize,
    pub exclusive_stop: usize,
}

impl BlockRange {
    pub fn len(&self) -> usize {
        self.exclusive_stop - self.inclusive_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.inclusive_start..self.exclusive_stop
    }
}

pub struct OrderedRangeFactory;

impl OrderedRangeFactory {
    /// Produces exactly `num_blocks` ranges covering `[start, start + count)`.
    ///
    /// Each range holds `count / num_blocks` elements and the first
    /// `count % num_blocks` ranges hold one more. When `count < num_blocks` the
    /// trailing ranges are empty.
    ///
    /// # Errors
    /// `InvalidArgument` if `num_blocks` is zero or the range end overflows.
    pub fn create(
        start: usize,
        count: usize,
        num_blocks: usize,
    ) -> Result<Vec<BlockRange>, DeltaCodecError> {
        if num_blocks == 0 {
            return Err(DeltaCodecError::InvalidArgument(
                "num_blocks must be at least 1".to_string(),
            ));
        }
        if start.checked_add(count).is_none() {
            return Err(DeltaCodecError::InvalidArgument(format!(
                "range {} + {} overflows usize",
                start, count
            )));
        }

        let base = count / num_blocks;
        let remainder = count % num_blocks;

        let mut ranges = Vec::with_capacity(num_blocks);
        let mut cursor = start;
        for i in 0..num_blocks {
            let len = base + usize::from(i < remainder);
            ranges.push(BlockRange {
                inclusive_start: cursor,
                exclusive_stop: cursor + len,
            });
            cursor += len;
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[BlockRange], start: usize, count: usize) {
        let mut expected_start = start;
        for r in ranges {
            assert_eq!(r.inclusive_start, expected_start);
            assert!(r.exclusive_stop >= r.inclusive_start);
            expected_start = r.exclusive_stop;
        }
        assert_eq!(expected_start, start + count);
        assert_eq!(ranges.iter().map(BlockRange::len).sum::<usize>(), count);
    }

    #[test]
    fn test_partitioner_coverage_grid() {
        for count in [0usize, 1, 2, 7, 8, 9, 100, 1000, 1001] {
            for blocks in 1..=17 {
                let ranges = OrderedRangeFactory::create(0, count, blocks).unwrap();
                assert_eq!(ranges.len(), blocks);
                assert_covers(&ranges, 0, count);
                let longest = ranges.iter().map(BlockRange::len).max().unwrap();
                let shortest = ranges.iter().map(BlockRange::len).min().unwrap();
                assert!(longest - shortest <= 1);
            }
        }
    }

    #[test]
    fn test_remainder_goes_to_front() {
        let ranges = OrderedRangeFactory::create(10, 10, 4).unwrap();
        let lens: Vec<usize> = ranges.iter().map(BlockRange::len).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
        assert_eq!(ranges[0].as_range(), 10..13);
        assert_eq!(ranges[3].as_range(), 18..20);
    }

    #[test]
    fn test_single_block_covers_everything() {
        let ranges = OrderedRangeFactory::create(5, 42, 1).unwrap();
        assert_eq!(ranges, vec![BlockRange { inclusive_start: 5, exclusive_stop: 47 }]);
    }

    #[test]
    fn test_fewer_elements_than_blocks_leaves_trailing_empties() {
        let ranges = OrderedRangeFactory::create(0, 2, 5).unwrap();
        let lens: Vec<usize> = ranges.iter().map(BlockRange::len).collect();
        assert_eq!(lens, vec![1, 1, 0, 0, 0]);
        assert!(ranges[4].is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            OrderedRangeFactory::create(0, 10, 0),
            Err(DeltaCodecError::InvalidArgument(_))
        ));
        assert!(matches!(
            OrderedRangeFactory::create(usize::MAX, 1, 1),
            Err(DeltaCodecError::InvalidArgument(_))
        ));
    }
}
