//! Part planning
//!
//! Splits a file of known size into fixed-size byte ranges. Ranges are
//! produced lazily; no bytes are read here.

/// One part of a file: the half-open byte range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based
    pub part_number: u32,
    pub start: u64,
    pub end: u64,
}

impl PartRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lazy sequence of part ranges covering `[0, size)` exactly once
#[derive(Debug, Clone)]
pub struct Chunker {
    size: u64,
    part_size: u64,
    next_start: u64,
    next_part: u32,
}

impl Chunker {
    /// A `part_size` of zero is treated as one byte.
    pub fn new(size: u64, part_size: u64) -> Self {
        Self {
            size,
            part_size: part_size.max(1),
            next_start: 0,
            next_part: 1,
        }
    }

    /// Total number of parts, `ceil(size / part_size)`, saturating at
    /// `u32::MAX`. Configuration keeps real uploads below that bound.
    pub fn part_count(&self) -> u32 {
        u32::try_from(self.size.div_ceil(self.part_size)).unwrap_or(u32::MAX)
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }
}

impl Iterator for Chunker {
    type Item = PartRange;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_start >= self.size || self.next_part == 0 {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.part_size).min(self.size);
        let range = PartRange {
            part_number: self.next_part,
            start,
            end,
        };

        self.next_start = end;
        // wraps to 0 past u32::MAX, which ends iteration
        self.next_part = self.next_part.wrapping_add(1);
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.next_part == 0 {
            return (0, Some(0));
        }
        let remaining = self.size.saturating_sub(self.next_start).div_ceil(self.part_size) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunker {}
