/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! The top-level [`Engine`]: wires components A-G together per spec §2's
//! per-request data flow, and confines all mutable engine state to one
//! `RwLock`-guarded instance (spec §9: "no process-global singletons").
//!
//! Grounded in `_opLazyCC.py::OpLazyCC` (`execute`, `propagateDirty` ->
//! `invalidate`) as the composition root.

use crate::config::EngineConfig;
use crate::dtype::{TypedInput, VoxelValue};
use crate::error::Result;
use crate::geometry::{ChunkGrid, Region};
use crate::growth;
use crate::label::LabelChunk;
use crate::output;
use crate::registry::ChunkRegistry;
use crate::store::{ChunkStore, InputProvider};
use crate::ticket::{LabelManager, TicketId};
use crate::union_find::UnionFind;
use dsi_progress_logger::prelude::*;
use log::debug;
use ndarray::{Array3, ArrayViewMut3};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// The mutable state an `invalidate()` swaps out wholesale (spec §3
/// addition; see DESIGN.md for why a single `RwLock` was chosen over
/// per-chunk generation tagging). The chunk store is handled separately:
/// since `Engine` only holds an `Arc<dyn ChunkStore>` supplied by the
/// caller, invalidation clears it in place (`ChunkStore::clear`) rather
/// than replacing the trait object.
struct EngineState {
    uf: UnionFind,
    registry: ChunkRegistry,
    label_manager: Arc<LabelManager>,
}

impl EngineState {
    fn new(grid: ChunkGrid) -> Self {
        Self {
            uf: UnionFind::new(),
            registry: ChunkRegistry::new(grid),
            label_manager: Arc::new(LabelManager::new()),
        }
    }
}

/// One dtype-monomorphic engine instance. [`Engine`] is the public,
/// dtype-erased wrapper around one of `EngineImpl<u8>`, `EngineImpl<u32>`,
/// `EngineImpl<u64>` (spec §9's dtype dispatch, made concrete).
struct EngineImpl<T: VoxelValue> {
    grid: ChunkGrid,
    input: Arc<dyn InputProvider<T>>,
    store: Arc<dyn ChunkStore>,
    labeler: Arc<dyn LabelChunk<T>>,
    state: RwLock<EngineState>,
}

impl<T: VoxelValue> EngineImpl<T> {
    fn new(
        input: Arc<dyn InputProvider<T>>,
        store: Arc<dyn ChunkStore>,
        labeler: Arc<dyn LabelChunk<T>>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let grid = ChunkGrid::new(input.shape(), config.chunk_shape);
        let state = RwLock::new(EngineState::new(grid.clone()));
        Ok(Self {
            grid,
            input,
            store,
            labeler,
            state,
        })
    }

    fn compute(
        &self,
        region: &Region,
        out: ArrayViewMut3<u32>,
        pl: &mut impl ConcurrentProgressLog,
    ) -> Result<()> {
        // A read guard held for the duration of one request: concurrent
        // `compute` calls proceed independently (spec §5: "no
        // single-threaded assumptions"); only `invalidate`'s write guard
        // excludes them.
        let state = self.state.read().unwrap();

        let seeds = self.grid.region_to_chunks(region);
        pl.item_name("chunk");
        pl.expected_updates(Some(seeds.len()));
        pl.start("growing region from seed chunks");

        // Per spec §2: "a sub-region is decomposed into chunk indices ->
        // each chunk is handed to the Growth Engine." Seeds are independent
        // (each spawns its own ticket), so they run concurrently, following
        // the teacher's `pl.clone()`-before-fan-out convention
        // (`webgraph_algo::sccs::symm_par`).
        let per_seed_pl: Vec<_> = seeds.iter().map(|_| pl.clone()).collect();
        let foreign_waits: Vec<HashSet<TicketId>> = seeds
            .par_iter()
            .zip(per_seed_pl.into_par_iter())
            .map(|(&seed, mut seed_pl)| {
                let result = growth::grow_region(
                    &self.grid,
                    &state.registry,
                    self.store.as_ref(),
                    self.input.as_ref(),
                    self.labeler.as_ref(),
                    &state.uf,
                    &state.label_manager,
                    seed,
                );
                seed_pl.light_update();
                result
            })
            .collect::<Result<Vec<_>>>()?;

        // Once every seed chunk's own growth run has completed, wait for
        // any other ticket whose claims overlapped ours (spec §2: "the
        // caller waits on D for any other in-flight tickets that own
        // overlapping labels").
        for waits in foreign_waits {
            state.label_manager.wait_for(&waits);
        }

        output::write_region(
            &self.grid,
            &state.registry,
            self.store.as_ref(),
            &state.uf,
            region,
            out,
        )?;
        pl.done();
        Ok(())
    }

    fn invalidate(&self) {
        let mut state = self.state.write().unwrap();
        *state = EngineState::new(self.grid.clone());
        self.store.clear();
        debug!("engine invalidated: union-find, registry, label manager reset, store cleared");
    }
}

/// Lazy, chunked connected-component labeling over one input volume + chunk
/// store (spec §1/§6). Dispatches internally on the input's element width
/// (`u8`/`u32`/`u64`); the core always operates on `u32` local labels.
pub enum Engine {
    U8(EngineImpl<u8>),
    U32(EngineImpl<u32>),
    U64(EngineImpl<u64>),
}

impl Engine {
    /// Builds a new engine over `input` (paired with its matching labeling
    /// primitive via [`TypedInput`]) and `store`, validating `config`
    /// against the input's shape (spec §7: `UnsupportedDtype`/
    /// `ShapeMismatch` are setup-time errors).
    pub fn new(input: TypedInput, store: Arc<dyn ChunkStore>, config: EngineConfig) -> Result<Self> {
        Ok(match input {
            TypedInput::U8 { input, labeler } => {
                Engine::U8(EngineImpl::new(input, store, labeler, config)?)
            }
            TypedInput::U32 { input, labeler } => {
                Engine::U32(EngineImpl::new(input, store, labeler, config)?)
            }
            TypedInput::U64 { input, labeler } => {
                Engine::U64(EngineImpl::new(input, store, labeler, config)?)
            }
        })
    }

    /// Labels `region` and writes the result into `out` (shape must equal
    /// `region.shape()`).
    pub fn compute(&self, region: &Region, out: ArrayViewMut3<u32>) -> Result<()> {
        self.compute_with_progress(region, out, no_logging![])
    }

    /// As [`Engine::compute`], reporting progress through `pl` (spec §9's
    /// ambient observability addition; `webgraph_algo::sccs::symm_par`'s
    /// `pl: &mut impl ConcurrentProgressLog` convention).
    pub fn compute_with_progress(
        &self,
        region: &Region,
        out: ArrayViewMut3<u32>,
        pl: &mut impl ConcurrentProgressLog,
    ) -> Result<()> {
        match self {
            Engine::U8(e) => e.compute(region, out, pl),
            Engine::U32(e) => e.compute(region, out, pl),
            Engine::U64(e) => e.compute(region, out, pl),
        }
    }

    /// Convenience wrapper allocating and returning the result.
    pub fn compute_alloc(&self, region: &Region) -> Result<Array3<u32>> {
        let shape = region.shape();
        let mut out = Array3::<u32>::zeros((shape[0] as usize, shape[1] as usize, shape[2] as usize));
        self.compute(region, out.view_mut())?;
        Ok(out)
    }

    /// Drops all cached labeling state (spec §6: "the next `compute`
    /// rebuilds"). Blocks until any in-flight `compute` calls finish
    /// (cancellation is not first-class, per spec §5).
    pub fn invalidate(&self) {
        match self {
            Engine::U8(e) => e.invalidate(),
            Engine::U32(e) => e.invalidate(),
            Engine::U64(e) => e.invalidate(),
        }
    }
}
