//! Stream-style read/write surface over the chunk pool.

use std::io;
use std::sync::Arc;
use std::thread;

use crate::error::{Error, Result};
use crate::pool::Pool;

/// Default number of chunks each pool queue may hold.
pub const DEFAULT_RING_CAPACITY: usize = 1024;

/// A concurrency-safe pooled ring buffer with stream-style read/write.
///
/// `Ring` sits between a byte producer and a byte consumer running
/// concurrently at possibly mismatched rates. Bytes written are placed into
/// recycled fixed-capacity chunks, so sustained traffic settles into a
/// steady state with no per-call allocation.
///
/// # Semantics
///
/// - **Write**: never suspends and never fails for lack of pool capacity;
///   it recycles a free chunk or allocates a tier-sized one.
/// - **Read**: in blocking mode suspends until data arrives; in
///   non-blocking mode returns [`Error::PoolEmpty`] immediately when
///   nothing is buffered. A read shorter than the destination is normal
///   stream behavior, not an error.
/// - **Ordering**: bytes keep their order within a single call; no order is
///   guaranteed across distinct concurrent calls. This is a cooperating
///   pipeline primitive, not an ordered multi-producer channel.
///
/// # Example
///
/// ```
/// use giztoy_ringpool::Ring;
///
/// let ring = Ring::with_capacity(true, 4);
/// assert_eq!(ring.write(b"abcde").unwrap(), 5);
///
/// let mut buf = [0u8; 5];
/// assert_eq!(ring.read(&mut buf).unwrap(), 5);
/// assert_eq!(&buf, b"abcde");
/// ```
///
/// Cloning a `Ring` clones the handle; all clones share one pool:
///
/// ```
/// use giztoy_ringpool::Ring;
/// use std::thread;
///
/// let ring = Ring::new(true);
/// let producer = ring.clone();
///
/// let handle = thread::spawn(move || {
///     producer.write(b"hello").unwrap();
/// });
///
/// let mut buf = [0u8; 5];
/// ring.read(&mut buf).unwrap();
/// handle.join().unwrap();
/// assert_eq!(&buf, b"hello");
/// ```
#[derive(Clone)]
pub struct Ring {
    pool: Arc<Pool>,
    blocking: bool,
    capacity: usize,
}

impl Ring {
    /// Creates a ring with the default per-queue capacity.
    ///
    /// In blocking mode a read with no buffered data suspends the caller
    /// until a write arrives; in non-blocking mode it returns
    /// [`Error::PoolEmpty`] immediately.
    pub fn new(blocking: bool) -> Self {
        Self::with_capacity(blocking, DEFAULT_RING_CAPACITY)
    }

    /// Creates a ring whose four queues each hold up to `capacity` chunks.
    ///
    /// Insertions beyond that bound discard the chunk rather than block the
    /// completing operation; size `capacity` for the expected working set
    /// and watch [`dropped_chunks`](Ring::dropped_chunks) for shortfalls.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(blocking: bool, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Ring {
            pool: Arc::new(Pool::new(capacity)),
            blocking,
            capacity,
        }
    }

    /// True when reads suspend on an empty pool.
    pub fn blocking(&self) -> bool {
        self.blocking
    }

    /// Per-queue chunk capacity this ring was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of chunks currently holding readable data.
    pub fn pending(&self) -> usize {
        self.pool.pending()
    }

    /// Total chunks ever allocated for this ring. Stable under steady-state
    /// reuse; growth means the free queue keeps running dry.
    pub fn allocated_chunks(&self) -> usize {
        self.pool.allocated()
    }

    /// Chunks discarded by the best-effort overflow policy. Non-zero means
    /// the configured capacity is too small for the working set.
    pub fn dropped_chunks(&self) -> usize {
        self.pool.dropped()
    }

    /// Reads buffered bytes into `buf`, returning how many were copied.
    ///
    /// The first chunk acquisition honors the ring's blocking mode; the
    /// continuation across further chunks never suspends, so the call may
    /// legitimately return fewer bytes than `buf.len()`.
    ///
    /// # Errors
    ///
    /// [`Error::BufferEmpty`] when `buf` is zero-length, and
    /// [`Error::PoolEmpty`] when nothing is buffered in non-blocking mode.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::BufferEmpty);
        }
        let Some(chunk) = self.pool.grab_ready(self.blocking) else {
            return Err(Error::PoolEmpty);
        };
        let mut n = self.pool.read_from(chunk, buf);
        while n < buf.len() {
            let Some(chunk) = self.pool.grab_leftover() else {
                break;
            };
            let nr = self.pool.read_from(chunk, &mut buf[n..]);
            if nr == 0 {
                // a drained chunk surfaced from a leftover queue; it went
                // back to free and nothing more is pending
                break;
            }
            n += nr;
        }
        if self.pool.sweep_due() {
            // reclaim abandoned leftover-write chunks off-thread so the
            // sweep never delays this caller
            let pool = Arc::clone(&self.pool);
            thread::spawn(move || pool.sweep());
        }
        Ok(n)
    }

    /// Writes all of `buf` into the ring, returning `buf.len()`.
    ///
    /// Recycles free chunks when available and otherwise allocates chunks
    /// tiered to the remaining length. A write the first chunk cannot
    /// absorb continues across further chunks; those are parked in the
    /// leftover-write queue and published to readers once the call
    /// finishes.
    ///
    /// # Errors
    ///
    /// [`Error::BufferEmpty`] when `buf` is zero-length. Pool exhaustion is
    /// never an error here.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::BufferEmpty);
        }
        let chunk = match self.pool.pop_free() {
            Some(chunk) => chunk,
            None => self.pool.allocate(buf.len()),
        };
        let mut n = self.pool.write_into(chunk, buf);
        if n < buf.len() {
            // the guard keeps the sweeper out of leftover-write until the
            // whole source is placed
            let guard = self.pool.writer_guard();
            while n < buf.len() {
                let remaining = &buf[n..];
                let chunk = match self.pool.pop_free() {
                    Some(chunk) => chunk,
                    None => self.pool.allocate(remaining.len()),
                };
                n += self.pool.write_leftover_into(chunk, remaining);
            }
            drop(guard);
            // make the parked chunks readable without waiting for the
            // periodic pass
            self.pool.sweep();
        }
        Ok(n)
    }
}

impl io::Read for Ring {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}

impl io::Write for Ring {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for &Ring {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ring::read(self, buf).map_err(Into::into)
    }
}

impl io::Write for &Ring {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ring::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pattern(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 56) as u8
            })
            .collect()
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let ring = Ring::with_capacity(true, 4);
        assert_eq!(ring.write(b"abcde").unwrap(), 5);

        let mut buf = [0u8; 5];
        assert_eq!(ring.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"abcde");
    }

    #[test]
    fn test_empty_buffers_are_rejected() {
        let ring = Ring::new(false);
        assert_eq!(ring.read(&mut []), Err(Error::BufferEmpty));
        assert_eq!(ring.write(&[]), Err(Error::BufferEmpty));
        // the guard fires before any queue is touched
        assert_eq!(ring.pending(), 0);
        assert_eq!(ring.allocated_chunks(), 0);
    }

    #[test]
    fn test_non_blocking_read_on_empty_pool() {
        let ring = Ring::new(false);
        let mut buf = [0xaau8; 16];
        assert_eq!(ring.read(&mut buf), Err(Error::PoolEmpty));
        assert_eq!(buf, [0xaau8; 16]);
    }

    #[test]
    fn test_short_read_is_not_an_error() {
        let ring = Ring::new(false);
        ring.write(b"abc").unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(ring.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_multi_chunk_write_spans_tiers() {
        let ring = Ring::new(false);

        // park a small chunk in the free queue
        let data = pattern(10, 1);
        ring.write(&data).unwrap();
        let mut sink = [0u8; 10];
        ring.read(&mut sink).unwrap();
        assert_eq!(ring.allocated_chunks(), 1);

        // the recycled small chunk only absorbs 1KB; the rest lands in a
        // freshly tiered chunk via the leftover-write path
        let data = pattern(3000, 2);
        assert_eq!(ring.write(&data).unwrap(), 3000);
        assert_eq!(ring.allocated_chunks(), 2);

        let mut out = vec![0u8; 3000];
        let mut received = 0;
        while received < 3000 {
            received += ring.read(&mut out[received..]).unwrap();
        }
        assert_eq!(out, data);
    }

    #[test]
    fn test_chunks_are_recycled_not_leaked() {
        let ring = Ring::new(false);
        let data = pattern(4097, 3);
        let mut out = vec![0u8; 4097];

        for _ in 0..50 {
            assert_eq!(ring.write(&data).unwrap(), 4097);
            let mut received = 0;
            while received < out.len() {
                received += ring.read(&mut out[received..]).unwrap();
            }
            assert_eq!(out, data);
        }

        // one huge-tier chunk keeps cycling through the free queue
        assert_eq!(ring.allocated_chunks(), 1);
        assert_eq!(ring.dropped_chunks(), 0);
    }

    #[test]
    fn test_blocking_read_waits_for_writer() {
        let ring = Ring::new(true);
        let reader = ring.clone();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 5];
            let n = reader.read(&mut buf).unwrap();
            (n, buf)
        });

        // give the reader time to park on the ready queue
        thread::sleep(Duration::from_millis(10));
        ring.write(b"hello").unwrap();

        let (n, buf) = handle.join().unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_concurrent_stream_preserves_content() {
        const TOTAL: usize = 200_000;
        let ring = Ring::new(true);
        let producer = ring.clone();
        let data = pattern(TOTAL, 4);
        let expected = data.clone();

        let handle = thread::spawn(move || {
            let mut sizes = 7u64;
            let mut offset = 0;
            while offset < data.len() {
                sizes = sizes
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                // single-chunk writes: one producer publishing whole chunks
                // keeps ready-queue order equal to write order
                let len = 1 + (sizes >> 48) as usize % 1000;
                let end = std::cmp::min(offset + len, data.len());
                producer.write(&data[offset..end]).unwrap();
                offset = end;
            }
        });

        let mut out = vec![0u8; TOTAL];
        let mut received = 0;
        while received < TOTAL {
            received += ring.read(&mut out[received..]).unwrap();
        }
        handle.join().unwrap();

        assert_eq!(out, expected);
        assert_eq!(ring.dropped_chunks(), 0);
    }

    #[test]
    fn test_clone_shares_the_pool() {
        let ring = Ring::new(false);
        let other = ring.clone();

        ring.write(b"shared").unwrap();
        let mut buf = [0u8; 6];
        assert_eq!(other.read(&mut buf).unwrap(), 6);
        assert_eq!(&buf, b"shared");
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = Ring::with_capacity(false, 0);
    }
}
