//! Pooled chunk and size-tier selection.

/// Chunk capacity for writes up to 1KB.
pub const SMALL_CHUNK_SIZE: usize = 1024;

/// Chunk capacity for writes up to 2KB.
pub const MEDIUM_CHUNK_SIZE: usize = 2048;

/// Chunk capacity for writes up to 4KB (one page on most systems).
pub const LARGE_CHUNK_SIZE: usize = 4096;

/// Chunk capacity for bulk writes, sized to a 2MB huge page so large
/// transfers amortize allocation cost over few chunks.
pub const HUGE_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Returns the smallest tier capacity that fits `size`.
///
/// Sizes beyond the largest breakpoint get the huge tier, trading some
/// internal fragmentation for fewer allocations on bulk transfers.
pub fn tier_for(size: usize) -> usize {
    if size <= SMALL_CHUNK_SIZE {
        SMALL_CHUNK_SIZE
    } else if size <= MEDIUM_CHUNK_SIZE {
        MEDIUM_CHUNK_SIZE
    } else if size <= LARGE_CHUNK_SIZE {
        LARGE_CHUNK_SIZE
    } else {
        HUGE_CHUNK_SIZE
    }
}

/// A fixed-capacity byte block with a produced/consumed window.
///
/// `buf[pos..len]` holds bytes produced but not yet consumed. A chunk is
/// held by exactly one queue or one in-progress operation at a time and
/// moves between them by value, never by aliasing.
#[derive(Debug)]
pub(crate) struct Chunk {
    buf: Box<[u8]>,
    len: usize,
    pos: usize,
}

impl Chunk {
    /// Creates an empty chunk whose capacity is the tier fitting `size`.
    pub(crate) fn with_tier(size: usize) -> Self {
        Chunk {
            buf: vec![0u8; tier_for(size)].into_boxed_slice(),
            len: 0,
            pos: 0,
        }
    }

    /// Total byte capacity of the chunk.
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes produced but not yet consumed.
    pub(crate) fn unread(&self) -> usize {
        self.len - self.pos
    }

    /// True once every produced byte has been consumed.
    pub(crate) fn is_drained(&self) -> bool {
        self.pos == self.len
    }

    /// Copies as much of `src` as the remaining capacity allows.
    ///
    /// A chunk fully drained by a prior owner is reset first so recycled
    /// chunks start producing from offset zero. Returns the number of
    /// bytes copied.
    ///
    /// # Panics
    ///
    /// Panics if no bytes could be copied from a non-empty `src`; that
    /// indicates a contract violation upstream, not a recoverable state.
    pub(crate) fn fill(&mut self, src: &[u8]) -> usize {
        if self.is_drained() {
            self.pos = 0;
            self.len = 0;
        }
        let n = std::cmp::min(self.buf.len() - self.len, src.len());
        assert!(n > 0, "chunk absorbed no bytes from a non-empty source");
        self.buf[self.len..self.len + n].copy_from_slice(&src[..n]);
        self.len += n;
        n
    }

    /// Copies from the unread window into `dest`, advancing the consumed
    /// cursor. Returns the number of bytes copied (zero when drained).
    pub(crate) fn read(&mut self, dest: &mut [u8]) -> usize {
        let n = std::cmp::min(dest.len(), self.unread());
        dest[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}
