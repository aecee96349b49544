/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Component G: the Output Mapper.
//!
//! Grounded in `_opLazyCC.py::_mapArray`/`_getLabelsForChunk(mapping=True)`:
//! building a `num_labels + 1`-length lookup table per chunk and indexing
//! the cached local-label slab through it to produce final contiguous
//! labels.

use crate::error::{Error, Result};
use crate::geometry::{ChunkGrid, Region};
use crate::registry::ChunkRegistry;
use crate::store::ChunkStore;
use crate::union_find::UnionFind;
use ndarray::ArrayViewMut3;

/// Writes the final, contiguous labeling of `region` into `out`.
///
/// `out`'s shape must equal `region.shape()`; `out[p]` receives the final
/// label of the voxel at `region.start + p`. Assumes every chunk
/// intersecting `region` is already `Labeled` and every boundary this
/// region could depend on has already been merged by the caller's growth
/// run (spec §2: "once F reports completion ... G walks the cache").
pub fn write_region(
    grid: &ChunkGrid,
    registry: &ChunkRegistry,
    store: &dyn ChunkStore,
    uf: &UnionFind,
    region: &Region,
    mut out: ArrayViewMut3<u32>,
) -> Result<()> {
    let origin = region.start;

    for coord in grid.region_to_chunks(region) {
        let chunk = registry.snapshot(coord);
        let chunk_region = grid.chunk_to_region(coord);
        let Some(sub) = chunk_region.intersect(region) else {
            continue;
        };

        // Per-chunk mapping table: index 0 is background, index i >= 1 is
        // the final label of local label i (spec §4.G step 2).
        let mut table = vec![0u32; chunk.num_labels as usize + 1];
        for local_label in 1..=chunk.num_labels {
            table[local_label as usize] = uf.finalize(chunk.offset + local_label);
        }

        let local = grid.to_local(coord, &sub);
        let slab = store.read_slab(coord, &local)?;

        for ((x, y, z), &local_label) in slab.indexed_iter() {
            let ox = sub.start[0] as usize + x - origin[0] as usize;
            let oy = sub.start[1] as usize + y - origin[1] as usize;
            let oz = sub.start[2] as usize + z - origin[2] as usize;
            let final_label = *table.get(local_label as usize).ok_or_else(|| {
                Error::Internal(format!(
                    "local label {local_label} out of range (num_labels={}) for chunk {coord}",
                    chunk.num_labels
                ))
            })?;
            out[[ox, oy, oz]] = final_label;
        }
    }

    Ok(())
}
