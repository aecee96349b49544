/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Component C: the Chunk Registry.
//!
//! Grounded in `_opLazyCC.py::_label`/`setupOutputs` (the `_numLabels`,
//! `_globalLabelOffset` per-chunk bookkeeping) plus spec §3/§4.C for the
//! `merged_with`/per-chunk-mutex machinery the original's single lazyflow
//! critical section didn't need but this crate's real concurrent locking
//! does.

use crate::dtype::VoxelValue;
use crate::error::Result;
use crate::geometry::{ChunkCoord, ChunkGrid};
use crate::label::LabelChunk;
use crate::store::{ChunkStore, InputProvider};
use crate::union_find::UnionFind;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A chunk's labeling state (spec §3 state machine: `Unlabeled -> Labeled`,
/// no other transitions within one input version).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Unlabeled,
    Labeled,
}

/// Per-chunk metadata (spec §3).
#[derive(Debug, Clone)]
pub struct Chunk {
    pub state: ChunkState,
    /// Number of distinct local labels, excluding background. Meaningless
    /// while `state == Unlabeled`.
    pub num_labels: u32,
    /// `global_index = local_label + offset - 1` for `local_label >= 1`.
    pub offset: u32,
    /// Neighbor coordinates whose shared face has already been merged
    /// against this chunk (spec §4.E: authoritative on the lexicographically
    /// smaller chunk of the pair).
    pub merged_with: HashSet<ChunkCoord>,
}

impl Chunk {
    fn unlabeled() -> Self {
        Self {
            state: ChunkState::Unlabeled,
            num_labels: 0,
            offset: 0,
            merged_with: HashSet::new(),
        }
    }
}

/// Tracks per-chunk labeling state across the whole input volume.
pub struct ChunkRegistry {
    grid: ChunkGrid,
    chunks: Mutex<HashMap<ChunkCoord, Arc<Mutex<Chunk>>>>,
}

impl ChunkRegistry {
    pub fn new(grid: ChunkGrid) -> Self {
        Self {
            grid,
            chunks: Mutex::new(HashMap::new()),
        }
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Lazily creates a chunk record, returning a handle to it. Callers that
    /// need to operate on two chunks at once (boundary merge, spec §5's
    /// chunk-lock acquisition order) must fetch both handles before locking
    /// either, then lock them in `ChunkCoord`'s natural order.
    pub fn get_or_init(&self, coord: ChunkCoord) -> Arc<Mutex<Chunk>> {
        let mut map = self.chunks.lock().unwrap();
        map.entry(coord)
            .or_insert_with(|| Arc::new(Mutex::new(Chunk::unlabeled())))
            .clone()
    }

    /// Takes the per-chunk mutex and invokes `f` on the chunk record.
    pub fn with_chunk_locked<R>(&self, coord: ChunkCoord, f: impl FnOnce(&mut Chunk) -> R) -> R {
        let handle = self.get_or_init(coord);
        let mut chunk = handle.lock().unwrap();
        f(&mut chunk)
    }

    /// A read-only copy of a chunk's current metadata.
    pub fn snapshot(&self, coord: ChunkCoord) -> Chunk {
        self.with_chunk_locked(coord, |c| c.clone())
    }

    /// Labels `coord` if it is still `Unlabeled`: fetches its raw sub-volume,
    /// runs the labeling primitive, writes the result to the store, and
    /// allocates `num_labels` fresh global indices in `uf`. No-op if the
    /// chunk is already `Labeled` (spec §4.C).
    pub fn label_if_needed<T: VoxelValue>(
        &self,
        coord: ChunkCoord,
        input: &dyn InputProvider<T>,
        store: &dyn ChunkStore,
        labeler: &dyn LabelChunk<T>,
        uf: &UnionFind,
    ) -> Result<()> {
        self.with_chunk_locked(coord, |chunk| {
            if chunk.state == ChunkState::Labeled {
                return Ok(());
            }

            let region = self.grid.chunk_to_region(coord);
            debug!("labeling chunk {coord} ({region:?})");
            let raw = input.read_region(&region)?;
            let (labels, num_labels) = labeler.label_chunk(&raw);

            store.write_chunk(coord, labels)?;

            chunk.num_labels = num_labels;
            if num_labels > 0 {
                let first_new_index = uf.make_new_indices(num_labels);
                chunk.offset = first_new_index - 1;
            }
            chunk.state = ChunkState::Labeled;
            debug!("chunk {coord} labeled: {num_labels} local labels");
            Ok(())
        })
    }
}
