//! Chunk pool: hand-off queues, acquisition ordering, and the sweep lease.
//!
//! The four bounded queues are the sole synchronization mechanism for chunk
//! ownership: a chunk is either parked in exactly one queue or held by
//! exactly one in-progress operation, never both. Coordination between
//! multi-chunk writers and the sweeper goes through a reader/writer lease
//! instead of per-chunk locks.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{trace, warn};

use crate::chunk::Chunk;

/// Seconds between periodic sweeps of the leftover-write queue.
pub(crate) const SWEEP_INTERVAL_SECS: u64 = 300;

/// Identifies one of the pool's hand-off queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueKind {
    /// Chunks fully produced, awaiting a reader.
    Ready,
    /// Drained chunks awaiting a producer.
    Free,
    /// Chunks partially consumed by an earlier read.
    LeftoverRead,
    /// Chunks partially produced by an in-progress multi-chunk write.
    LeftoverWrite,
}

impl QueueKind {
    fn as_str(self) -> &'static str {
        match self {
            QueueKind::Ready => "ready",
            QueueKind::Free => "free",
            QueueKind::LeftoverRead => "leftover-read",
            QueueKind::LeftoverWrite => "leftover-write",
        }
    }
}

/// A bounded FIFO hand-off queue of owned chunks.
///
/// Both a blocking take and a non-blocking take are offered; insertion is
/// always best-effort so a completing read/write step never waits on queue
/// capacity.
struct ChunkQueue {
    tx: Sender<Chunk>,
    rx: Receiver<Chunk>,
}

impl ChunkQueue {
    fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        ChunkQueue { tx, rx }
    }

    /// Best-effort insert. Hands the chunk back when the queue is full.
    fn offer(&self, chunk: Chunk) -> Option<Chunk> {
        match self.tx.try_send(chunk) {
            Ok(()) => None,
            Err(TrySendError::Full(chunk)) | Err(TrySendError::Disconnected(chunk)) => Some(chunk),
        }
    }

    fn try_take(&self) -> Option<Chunk> {
        self.rx.try_recv().ok()
    }

    /// Blocking take; suspends the caller until a chunk is handed off.
    /// The pool owns a sender for its whole lifetime, so disconnection is
    /// only observable while the pool itself is being dropped.
    fn take(&self) -> Option<Chunk> {
        self.rx.recv().ok()
    }

    fn len(&self) -> usize {
        self.rx.len()
    }

    fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// The chunk pool behind a [`Ring`](crate::Ring).
///
/// # Overflow policy
///
/// Queue insertions never block: when a target queue is at capacity the
/// chunk is discarded, its loss is counted, and a warning is emitted. This
/// keeps every read/write step non-blocking at the cost of chunk loss when
/// `capacity` is under-provisioned for the working set; callers can watch
/// the dropped counter to detect that.
pub(crate) struct Pool {
    /// Fully produced chunks awaiting a reader.
    ready: ChunkQueue,
    /// Drained chunks awaiting a producer.
    free: ChunkQueue,
    /// Partially consumed chunks; the next read finishes them first.
    leftover_read: ChunkQueue,
    /// Partially produced chunks from an in-progress multi-chunk write.
    leftover_write: ChunkQueue,
    /// In-flight multi-chunk writers hold read guards; the sweeper needs
    /// the write guard. One lock gives both "no sweep while writers are
    /// mid-loop" and "at most one sweep at a time".
    sweep_lease: RwLock<()>,
    epoch: Instant,
    /// Seconds since `epoch` at the last completed sweep.
    last_sweep: AtomicU64,
    /// Chunks ever created for this pool.
    allocated: AtomicUsize,
    /// Chunks discarded by the overflow policy.
    dropped: AtomicUsize,
}

impl Pool {
    pub(crate) fn new(capacity: usize) -> Self {
        Pool {
            ready: ChunkQueue::with_capacity(capacity),
            free: ChunkQueue::with_capacity(capacity),
            leftover_read: ChunkQueue::with_capacity(capacity),
            leftover_write: ChunkQueue::with_capacity(capacity),
            sweep_lease: RwLock::new(()),
            epoch: Instant::now(),
            last_sweep: AtomicU64::new(0),
            allocated: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Creates a fresh chunk tiered to `size`, counting the allocation.
    pub(crate) fn allocate(&self, size: usize) -> Chunk {
        self.allocated.fetch_add(1, Ordering::Relaxed);
        Chunk::with_tier(size)
    }

    /// Pops a recycled chunk, if any writer returned one.
    pub(crate) fn pop_free(&self) -> Option<Chunk> {
        self.free.try_take()
    }

    fn route(&self, queue: &ChunkQueue, kind: QueueKind, chunk: Chunk) {
        if let Some(chunk) = queue.offer(chunk) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                queue = kind.as_str(),
                unread = chunk.unread(),
                cap = chunk.capacity(),
                "queue at capacity, discarding chunk"
            );
        }
    }

    /// Fills the chunk from `src` and publishes it as fully produced.
    pub(crate) fn write_into(&self, mut chunk: Chunk, src: &[u8]) -> usize {
        let n = chunk.fill(src);
        self.route(&self.ready, QueueKind::Ready, chunk);
        n
    }

    /// Fills the chunk from `src` and parks it for the multi-chunk write
    /// still in progress.
    pub(crate) fn write_leftover_into(&self, mut chunk: Chunk, src: &[u8]) -> usize {
        let n = chunk.fill(src);
        self.route(&self.leftover_write, QueueKind::LeftoverWrite, chunk);
        n
    }

    /// Copies out of the chunk and routes the remainder: drained chunks go
    /// back to the free queue, anything else waits in leftover-read for the
    /// next read to finish it.
    pub(crate) fn read_from(&self, mut chunk: Chunk, dest: &mut [u8]) -> usize {
        let n = chunk.read(dest);
        if chunk.is_drained() {
            self.route(&self.free, QueueKind::Free, chunk);
        } else {
            self.route(&self.leftover_read, QueueKind::LeftoverRead, chunk);
        }
        n
    }

    /// Acquires a readable chunk: leftover-read first so an interrupted
    /// read resumes where it stopped, then ready. Blocking mode suspends on
    /// the ready queue when both are momentarily empty.
    pub(crate) fn grab_ready(&self, blocking: bool) -> Option<Chunk> {
        if let Some(chunk) = self.leftover_read.try_take() {
            return Some(chunk);
        }
        if blocking {
            self.ready.take()
        } else {
            self.ready.try_take()
        }
    }

    /// Continuation acquisition for a read that has not yet filled its
    /// destination: leftover-write first, then the normal read order.
    ///
    /// Never blocks, whatever the ring mode; a short read is normal stream
    /// behavior. Returns `None` while the sweeper holds the lease to avoid
    /// racing with it.
    pub(crate) fn grab_leftover(&self) -> Option<Chunk> {
        let _guard = self.sweep_lease.try_read()?;
        self.leftover_write
            .try_take()
            .or_else(|| self.grab_ready(false))
    }

    /// Marks a multi-chunk write as in flight for the guard's lifetime,
    /// keeping the sweeper out of leftover-write mid-transfer.
    pub(crate) fn writer_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.sweep_lease.read()
    }

    /// Reclaims abandoned leftover-write chunks into the ready queue so
    /// their data becomes visible to future reads.
    ///
    /// No-op while any multi-chunk write is in flight or another sweep is
    /// already running.
    pub(crate) fn sweep(&self) {
        if self.leftover_write.is_empty() {
            // nothing to reclaim; restart the interval so the read path
            // does not keep re-triggering
            self.last_sweep
                .store(self.epoch.elapsed().as_secs(), Ordering::Relaxed);
            return;
        }
        let Some(_guard) = self.sweep_lease.try_write() else {
            return;
        };
        let moved = self.flush(QueueKind::LeftoverWrite);
        self.last_sweep
            .store(self.epoch.elapsed().as_secs(), Ordering::Relaxed);
        if moved > 0 {
            trace!(moved, "sweep reclaimed leftover-write chunks");
        }
    }

    /// Drains one leftover queue into ready, preserving each chunk's unread
    /// window. Caller must hold the sweep lease.
    ///
    /// The drain stops once the source queue reports empty; under a
    /// concurrent producer that is an approximation, not a barrier.
    fn flush(&self, kind: QueueKind) -> usize {
        let source = match kind {
            QueueKind::LeftoverRead => &self.leftover_read,
            QueueKind::LeftoverWrite => &self.leftover_write,
            // ready and free never hold stuck data
            QueueKind::Ready | QueueKind::Free => return 0,
        };
        let mut moved = 0;
        while let Some(chunk) = source.try_take() {
            self.route(&self.ready, QueueKind::Ready, chunk);
            moved += 1;
        }
        moved
    }

    /// True when the periodic sweep from the read path is due.
    pub(crate) fn sweep_due(&self) -> bool {
        let now = self.epoch.elapsed().as_secs();
        now.saturating_sub(self.last_sweep.load(Ordering::Relaxed)) >= SWEEP_INTERVAL_SECS
    }

    /// Chunks currently holding readable data.
    pub(crate) fn pending(&self) -> usize {
        self.ready.len() + self.leftover_read.len() + self.leftover_write.len()
    }

    pub(crate) fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    pub(crate) fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}
