//! Concurrency-safe pooled ring buffer with stream-style read/write.
//!
//! This crate provides [`Ring`], a byte-stream primitive that sits between
//! a producer and a consumer running concurrently at different rates. Bytes
//! are carried in fixed-capacity chunks recycled through a small set of
//! hand-off queues, so sustained traffic runs without per-call allocation.
//!
//! # Design
//!
//! A chunk is always owned by exactly one queue or one in-progress
//! operation; ownership moves by hand-off, never by sharing. Four bounded
//! queues cover the chunk lifecycle:
//!
//! - **ready** — fully produced, awaiting a reader
//! - **free** — drained, awaiting a producer
//! - **leftover-read** — partially consumed, finished by the next read
//! - **leftover-write** — parked by a multi-chunk write still in progress
//!
//! A periodic sweep moves abandoned leftover-write chunks into the ready
//! queue so partially produced data is never stranded. Chunk capacities
//! come from a small tier table ([`tier_for`]) keyed by write size, trading
//! some internal fragmentation for fewer allocations on bulk transfers.
//!
//! # Modes
//!
//! In blocking mode a read on an empty ring suspends until data arrives; in
//! non-blocking mode it returns [`Error::PoolEmpty`] immediately. Writes
//! never suspend in either mode: they allocate instead of waiting.
//!
//! # Example
//!
//! ```
//! use giztoy_ringpool::Ring;
//! use std::thread;
//!
//! let ring = Ring::new(true);
//! let producer = ring.clone();
//!
//! let handle = thread::spawn(move || {
//!     producer.write(b"abcde").unwrap();
//! });
//!
//! let mut buf = [0u8; 5];
//! let n = ring.read(&mut buf).unwrap();
//! handle.join().unwrap();
//!
//! assert_eq!(n, 5);
//! assert_eq!(&buf, b"abcde");
//! ```
//!
//! # Limits
//!
//! Bytes keep their order within one call, not across distinct concurrent
//! calls; this is a cooperating-pipeline primitive, not an ordered
//! multi-producer channel. Queue insertions are best-effort: an
//! under-provisioned capacity discards chunks instead of applying
//! backpressure (see [`Ring::dropped_chunks`]). There is no cancellation
//! or timeout; callers needing deadlines must wrap calls themselves.

mod chunk;
mod error;
mod pool;
mod ring;

pub use chunk::{
    HUGE_CHUNK_SIZE, LARGE_CHUNK_SIZE, MEDIUM_CHUNK_SIZE, SMALL_CHUNK_SIZE, tier_for,
};
pub use error::{Error, Result};
pub use ring::{DEFAULT_RING_CAPACITY, Ring};
