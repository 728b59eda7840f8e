#![forbid(unsafe_code)]

//! Core data structures for panesync.
//!
//! # Key Components
//!
//! - [`IndexedPriorityQueue`] - binary heap with update/remove by identity
//! - [`AccumulationCache`] - prefix sums with lazy, smallest-first invalidation
//!
//! # Role in panesync
//! These are leaf utilities with no dependency on the alignment engine. The
//! cache answers "which row sits at cumulative offset X" for presentation
//! layers that give rows variable heights.

pub mod acache;
pub mod pq;

pub use acache::AccumulationCache;
pub use pq::{IndexedPriorityQueue, Orientation, QueueError};
