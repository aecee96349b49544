/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Lazy, chunked connected-component labeling of large 3D binary/integer
//! volumes.
//!
//! A caller requests a sub-region of the labeled output; the engine labels
//! only the chunks whose labels could influence that region, growing
//! outward along chunk boundaries exactly as far as required to guarantee
//! that every component intersecting the requested region receives a
//! single, stable, globally-unique label. Results are cached so that
//! subsequent overlapping requests reuse prior work, and labels stay
//! consistent across any sequence of (possibly concurrent) requests.
//!
//! The engine is built from three tightly coupled subsystems:
//! - a concurrent disjoint-set structure over integer indices
//!   ([`union_find`]),
//! - a per-chunk label-state registry with a compressed local-label cache
//!   ([`registry`]), and
//! - a region-growing finalization engine that transitively labels and
//!   merges adjacent chunks until every component touching the requested
//!   region has been fully traced ([`growth`]).
//!
//! The per-chunk labeling primitive, the chunk store, and the surrounding
//! dataflow framework are external collaborators ([`label`], [`store`]):
//! only their trait shapes are part of this crate's contract.
//!
//! # Example
//!
//! ```
//! use lazycc::prelude::*;
//! use ndarray::Array3;
//! use std::sync::Arc;
//!
//! let mut vol = Array3::<u8>::zeros((20, 20, 1));
//! for x in 2..6 {
//!     for y in 2..6 {
//!         vol[[x, y, 0]] = 1;
//!     }
//! }
//!
//! let input = Arc::new(MemoryInput::new(vol));
//! let store: Arc<dyn ChunkStore> = Arc::new(MemoryStore::new());
//! let labeler = Arc::new(BackgroundAwareLabeler);
//!
//! let engine = Engine::new(
//!     TypedInput::u8(input, labeler),
//!     store,
//!     EngineConfig::new([10, 10, 1]),
//! )
//! .unwrap();
//!
//! let region = Region::new([0, 0, 0], [20, 20, 1]);
//! let out = engine.compute_alloc(&region).unwrap();
//! assert_eq!(out[[0, 0, 0]], 0);
//! assert_ne!(out[[2, 2, 0]], 0);
//! ```

pub mod config;
pub mod dtype;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod growth;
pub mod label;
pub mod merge;
pub mod output;
pub mod registry;
pub mod store;
pub mod ticket;
pub mod union_find;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};

/// Re-exports the common entry points for building and driving an
/// [`Engine`], mirroring the flat re-export style of the teacher's own
/// crate roots.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::dtype::{TypedInput, VoxelValue};
    pub use crate::engine::Engine;
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{Axis, ChunkCoord, ChunkGrid, Region};
    pub use crate::label::{BackgroundAwareLabeler, LabelChunk};
    pub use crate::store::{ChunkStore, CountingInput, InputProvider, MemoryInput, MemoryStore};
}
