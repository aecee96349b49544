/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Component F: the Growth Engine.
//!
//! Grounded in spec §4.F's pseudocode (the authoritative source: §9
//! explicitly directs that the original's plain DFS recursion in
//! `_opLazyCC.py::_finalize` be replaced by an explicit frontier, which
//! bounds stack growth and gives a clear cancellation point) plus
//! `_opLazyCC.py::_generateNeighbours` for the neighbor-walk shape.

use crate::dtype::VoxelValue;
use crate::error::Result;
use crate::geometry::{ChunkCoord, ChunkGrid};
use crate::label::LabelChunk;
use crate::merge;
use crate::registry::ChunkRegistry;
use crate::store::{ChunkStore, InputProvider};
use crate::ticket::{LabelManager, TicketId};
use crate::union_find::UnionFind;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

/// Drives region-growing finalization from one seed chunk.
///
/// Labels the seed, merges it with its neighbors, discovers which of the
/// seed's labels extend into each neighbor, and recurses outward along an
/// explicit frontier until every component touching the seed has been fully
/// traced and merged. Returns the set of foreign ticket ids whose in-flight
/// claims overlapped labels this run touched — the caller must
/// `label_manager.wait_for` them before treating the resulting labeling as
/// final (spec §2, §4.F).
pub fn grow_region<T: VoxelValue>(
    grid: &ChunkGrid,
    registry: &ChunkRegistry,
    store: &dyn ChunkStore,
    input: &dyn InputProvider<T>,
    labeler: &dyn LabelChunk<T>,
    uf: &UnionFind,
    label_manager: &Arc<LabelManager>,
    seed: ChunkCoord,
) -> Result<HashSet<TicketId>> {
    let ticket = label_manager.register();
    let mut foreign_waits = HashSet::new();

    // Once a chunk has been popped and checked out, re-visiting it is a
    // no-op: `checkout` always claims the chunk's *entire* local-label set
    // on first visit (not just the labels a neighbor extended into it), so
    // a second visit by the same ticket can never discover anything new.
    // Tracking this set keeps the frontier's total work bounded by the
    // number of reachable chunks rather than the number of edges crossed.
    let mut processed: HashSet<ChunkCoord> = HashSet::new();
    let mut queued: HashSet<ChunkCoord> = HashSet::from([seed]);
    // A stack (depth-first pop) per spec §4.F: "depth-first tends to bound
    // frontier size"; correctness does not depend on the order.
    let mut frontier: Vec<ChunkCoord> = vec![seed];

    while let Some(c) = frontier.pop() {
        queued.remove(&c);
        if !processed.insert(c) {
            continue;
        }

        registry.label_if_needed(c, input, store, labeler, uf)?;
        let num_labels = registry.snapshot(c).num_labels;
        let labels_in_chunk: HashSet<u32> = (1..=num_labels).collect();

        let (mine, others) = label_manager.checkout(c, &labels_in_chunk, ticket.id());
        foreign_waits.extend(others);

        for n in grid.neighbors(c) {
            registry.label_if_needed(n, input, store, labeler, uf)?;
            let pair_uniqs = merge::boundary_merge(grid, registry, store, input, uf, c, n)?;
            let extending: HashSet<u32> = pair_uniqs
                .into_iter()
                .filter(|(on_c, _)| mine.contains(on_c))
                .map(|(_, on_n)| on_n)
                .collect();

            if !extending.is_empty() && !processed.contains(&n) && queued.insert(n) {
                frontier.push(n);
            }
        }
    }

    debug!(
        "ticket {} grew from {seed}: {} chunks processed, {} foreign tickets to await",
        ticket.id(),
        processed.len(),
        foreign_waits.len()
    );
    // `ticket` drops here, unregistering it and waking any `wait_for` callers.
    Ok(foreign_waits)
}
