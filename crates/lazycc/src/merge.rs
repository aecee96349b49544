/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Component E: the Boundary Merger.
//!
//! Grounded in `lazycc/_merge.py::mergeLabels` (face mask
//! `hyperplane_a == hyperplane_b`) and spec §9's resolution of the Open
//! Question the original's drafts disagreed on: union only where both local
//! labels are nonzero *and* the raw inputs are equal, required to label
//! non-binary integer inputs correctly (see DESIGN.md).

use crate::dtype::VoxelValue;
use crate::error::Result;
use crate::geometry::{ordered_pair, ChunkCoord, ChunkGrid};
use crate::registry::ChunkRegistry;
use crate::store::{ChunkStore, InputProvider};
use crate::union_find::UnionFind;
use log::trace;
use std::collections::HashSet;

/// Merges the shared face between `a` and `b` (in either order) and returns
/// the local-label pairs found to co-occur there, aligned as
/// `(label_on_a, label_on_b)` regardless of which of the two is
/// lexicographically smaller.
///
/// The union-find unions implied by those pairs are only ever *performed*
/// once per unordered pair (guarded by `merged_with`, spec §4.E step 1/6);
/// the pairs themselves are recomputed and returned every call, since the
/// Growth Engine (component F) needs them on every visit to route its
/// frontier, not just the first.
pub fn boundary_merge<T: VoxelValue>(
    grid: &ChunkGrid,
    registry: &ChunkRegistry,
    store: &dyn ChunkStore,
    input: &dyn InputProvider<T>,
    uf: &UnionFind,
    a: ChunkCoord,
    b: ChunkCoord,
) -> Result<Vec<(u32, u32)>> {
    let (lo, hi) = ordered_pair(a, b);

    // Lock acquisition order follows ChunkCoord's natural (lexicographic)
    // order, per spec §5, regardless of which of a/b is lo.
    let lo_handle = registry.get_or_init(lo);
    let hi_handle = registry.get_or_init(hi);
    let mut lo_chunk = lo_handle.lock().unwrap();
    let mut hi_chunk = hi_handle.lock().unwrap();

    let pairs = if lo_chunk.num_labels == 0 || hi_chunk.num_labels == 0 {
        HashSet::new()
    } else {
        let (face_lo, face_hi, _axis) = grid.shared_face(lo, hi);

        let raw_lo = input.read_region(&face_lo)?;
        let raw_hi = input.read_region(&face_hi)?;
        let labels_lo = store.read_slab(lo, &grid.to_local(lo, &face_lo))?;
        let labels_hi = store.read_slab(hi, &grid.to_local(hi, &face_hi))?;

        let mut pairs = HashSet::new();
        for (((&la, &lb), &ia), &ib) in labels_lo
            .iter()
            .zip(labels_hi.iter())
            .zip(raw_lo.iter())
            .zip(raw_hi.iter())
        {
            if la > 0 && lb > 0 && ia == ib {
                pairs.insert((la, lb));
            }
        }
        pairs
    };

    if !lo_chunk.merged_with.contains(&hi) {
        for &(la, lb) in &pairs {
            uf.union(lo_chunk.offset + la, hi_chunk.offset + lb);
        }
        lo_chunk.merged_with.insert(hi);
        trace!("merged {lo} | {hi}: {} co-occurring label pairs", pairs.len());
    }

    let mut out: Vec<(u32, u32)> = pairs.into_iter().collect();
    if a != lo {
        for pair in out.iter_mut() {
            std::mem::swap(&mut pair.0, &mut pair.1);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::BackgroundAwareLabeler;
    use crate::store::{MemoryInput, MemoryStore};
    use ndarray::Array3;

    fn setup(vol: Array3<u8>, chunk_shape: [u32; 3]) -> (ChunkGrid, ChunkRegistry, MemoryStore, MemoryInput<u8>, UnionFind) {
        let (nx, ny, nz) = vol.dim();
        let grid = ChunkGrid::new([nx as u64, ny as u64, nz as u64], chunk_shape);
        let registry = ChunkRegistry::new(grid.clone());
        let store = MemoryStore::new();
        let input = MemoryInput::new(vol);
        let uf = UnionFind::new();
        (grid, registry, store, input, uf)
    }

    #[test]
    fn merging_unions_matching_nonzero_labels_across_face() {
        let mut vol = Array3::<u8>::zeros((4, 2, 1));
        for x in 0..4 {
            vol[[x, 0, 0]] = 1;
        }
        let (grid, registry, store, input, uf) = setup(vol, [2, 2, 1]);
        let labeler = BackgroundAwareLabeler;

        let a = ChunkCoord([0, 0, 0]);
        let b = ChunkCoord([1, 0, 0]);
        registry
            .label_if_needed(a, &input, &store, &labeler, &uf)
            .unwrap();
        registry
            .label_if_needed(b, &input, &store, &labeler, &uf)
            .unwrap();

        let pairs = boundary_merge(&grid, &registry, &store, &input, &uf, a, b).unwrap();
        assert_eq!(pairs.len(), 1);
        let (la, lb) = pairs[0];

        let offset_a = registry.snapshot(a).offset;
        let offset_b = registry.snapshot(b).offset;
        assert_eq!(uf.find(offset_a + la), uf.find(offset_b + lb));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut vol = Array3::<u8>::zeros((4, 2, 1));
        for x in 0..4 {
            vol[[x, 0, 0]] = 1;
        }
        let (grid, registry, store, input, uf) = setup(vol, [2, 2, 1]);
        let labeler = BackgroundAwareLabeler;
        let a = ChunkCoord([0, 0, 0]);
        let b = ChunkCoord([1, 0, 0]);
        registry
            .label_if_needed(a, &input, &store, &labeler, &uf)
            .unwrap();
        registry
            .label_if_needed(b, &input, &store, &labeler, &uf)
            .unwrap();

        let first = boundary_merge(&grid, &registry, &store, &input, &uf, a, b).unwrap();
        let second = boundary_merge(&grid, &registry, &store, &input, &uf, a, b).unwrap();
        assert_eq!(first, second);
        assert!(registry.snapshot(a).merged_with.contains(&b));
    }

    #[test]
    fn order_of_arguments_does_not_affect_pair_alignment() {
        let mut vol = Array3::<u8>::zeros((4, 2, 1));
        for x in 0..4 {
            vol[[x, 0, 0]] = 1;
        }
        let (grid, registry, store, input, uf) = setup(vol, [2, 2, 1]);
        let labeler = BackgroundAwareLabeler;
        let a = ChunkCoord([0, 0, 0]);
        let b = ChunkCoord([1, 0, 0]);
        registry
            .label_if_needed(a, &input, &store, &labeler, &uf)
            .unwrap();
        registry
            .label_if_needed(b, &input, &store, &labeler, &uf)
            .unwrap();

        let ab = boundary_merge(&grid, &registry, &store, &input, &uf, a, b).unwrap();
        let ba = boundary_merge(&grid, &registry, &store, &input, &uf, b, a).unwrap();
        let swapped: Vec<(u32, u32)> = ab.iter().map(|&(x, y)| (y, x)).collect();
        assert_eq!(swapped, ba);
    }
}
