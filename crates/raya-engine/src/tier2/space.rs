//! `BBSpace`: a bump allocator for basic-block codeunit streams, backed
//! by a chain of fixed-size segments so existing `BBSpacePtr`s never
//! move.

use super::codeunit::CodeUnit;
use super::error::{Tier2Error, Tier2Result};

/// Default segment size, in codeunits: 64 KiB of `CodeUnit`s (each 2
/// bytes), a round default in line with this engine's other buffer sizes.
pub const DEFAULT_SEGMENT_CODEUNITS: usize = 32 * 1024;

/// A stable pointer into a [`BBSpace`]: which segment, and the offset of
/// the first codeunit within it. Stable across further `emit` calls,
/// since segments are never moved or reallocated once appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBSpacePtr {
    segment: usize,
    offset: usize,
}

struct Segment {
    units: Vec<CodeUnit>,
    capacity: usize,
}

impl Segment {
    fn new(capacity: usize) -> Self {
        Segment { units: Vec::with_capacity(capacity), capacity }
    }

    fn remaining(&self) -> usize {
        self.capacity - self.units.len()
    }
}

/// A bump allocator for emitted basic blocks. Never reallocates an
/// existing segment in place — once a block is appended, its
/// [`BBSpacePtr`] and the `&[CodeUnit]` slice it resolves to stay valid
/// for the life of the `BBSpace`. When the current segment can't fit a
/// new block, a fresh segment is chained on.
pub struct BBSpace {
    segment_capacity: usize,
    segments: Vec<Segment>,
}

impl BBSpace {
    /// A fresh, empty space with the given segment size (in codeunits).
    pub fn new(segment_capacity: usize) -> Self {
        assert!(segment_capacity > 0, "BBSpace segment capacity must be nonzero");
        BBSpace { segment_capacity, segments: vec![Segment::new(segment_capacity)] }
    }

    /// Append a basic block's codeunits, returning a pointer stable for
    /// the life of this `BBSpace`.
    ///
    /// Fails only if a single block is larger than the configured segment
    /// size — such a block could never fit any segment this allocator
    /// would create, so the caller should either raise
    /// `Tier2Config::bb_space_segment_bytes` or reject the block at build
    /// time.
    pub fn emit(&mut self, units: &[CodeUnit]) -> Tier2Result<BBSpacePtr> {
        if units.len() > self.segment_capacity {
            return Err(Tier2Error::OutOfMemory);
        }

        let last = self.segments.len() - 1;
        if self.segments[last].remaining() < units.len() {
            self.segments.push(Segment::new(self.segment_capacity));
        }

        let segment = self.segments.len() - 1;
        let seg = &mut self.segments[segment];
        let offset = seg.units.len();
        seg.units.extend_from_slice(units);

        Ok(BBSpacePtr { segment, offset })
    }

    /// Resolve a pointer back to the codeunits emitted there.
    pub fn resolve(&self, ptr: BBSpacePtr) -> &[CodeUnit] {
        &self.segments[ptr.segment].units[ptr.offset..]
    }

    /// Overwrite a single codeunit within an already-emitted block, used by
    /// the lazy linker to rewrite a terminator placeholder in place once
    /// its successor is known. `index` is relative to `ptr`, not the
    /// segment.
    pub fn overwrite(&mut self, ptr: BBSpacePtr, index: usize, unit: CodeUnit) {
        self.segments[ptr.segment].units[ptr.offset + index] = unit;
    }

    /// Total number of segments currently allocated.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total codeunits written across all segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.units.len()).sum()
    }

    /// Whether no codeunits have been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BBSpace {
    fn default() -> Self {
        BBSpace::new(DEFAULT_SEGMENT_CODEUNITS)
    }
}
