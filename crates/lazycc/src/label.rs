/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! The per-chunk single-pass labeling primitive (spec §1: "treated as a
//! black-box operation `label_chunk(input) -> (labels, num_labels)`").
//!
//! Only the trait is part of the spec's contract. [`BackgroundAwareLabeler`]
//! is a reference implementation — background-aware, 6-connected flood fill
//! — grounded in the original's use of
//! `vigra.analysis.labelVolumeWithBackground`, included so this crate's own
//! tests and the end-to-end scenarios in spec §8 are runnable standalone.

use crate::dtype::VoxelValue;
use ndarray::Array3;

/// Labels the foreground of one dense chunk.
///
/// Implementations must return labels dense in `[0, num_labels]` with `0`
/// reserved for background voxels (`T::default()`), and must be
/// deterministic and stateless — this is called once per chunk per input
/// version (spec §4.C: `label_if_needed`).
pub trait LabelChunk<T: VoxelValue>: Send + Sync {
    fn label_chunk(&self, input: &Array3<T>) -> (Array3<u32>, u32);
}

/// A 6-connected, background-aware flood-fill labeler.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundAwareLabeler;

const NEIGHBOR_OFFSETS: [(i64, i64, i64); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

impl<T: VoxelValue> LabelChunk<T> for BackgroundAwareLabeler {
    fn label_chunk(&self, input: &Array3<T>) -> (Array3<u32>, u32) {
        let shape = input.dim();
        let (nx, ny, nz) = shape;
        let mut labels = Array3::<u32>::zeros(shape);
        let background = T::default();
        let mut next_label = 0u32;
        let mut stack = Vec::new();

        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    if input[[x, y, z]] == background || labels[[x, y, z]] != 0 {
                        continue;
                    }
                    next_label += 1;
                    labels[[x, y, z]] = next_label;
                    stack.push((x, y, z));

                    while let Some((cx, cy, cz)) = stack.pop() {
                        let here = input[[cx, cy, cz]];
                        for (dx, dy, dz) in NEIGHBOR_OFFSETS {
                            let (Some(ax), Some(ay), Some(az)) = (
                                offset(cx, dx, nx),
                                offset(cy, dy, ny),
                                offset(cz, dz, nz),
                            ) else {
                                continue;
                            };
                            // Flood only across voxels of the *same* raw
                            // value, matching the Boundary Merger's
                            // `ia == ib` rule (spec §9) so a chunk-interior
                            // face between two different nonzero values is
                            // labeled the same way a chunk-crossing face is:
                            // as two distinct components.
                            if input[[ax, ay, az]] == here && labels[[ax, ay, az]] == 0 {
                                labels[[ax, ay, az]] = next_label;
                                stack.push((ax, ay, az));
                            }
                        }
                    }
                }
            }
        }

        (labels, next_label)
    }
}

#[inline]
fn offset(v: usize, d: i64, bound: usize) -> Option<usize> {
    let nv = v as i64 + d;
    if nv < 0 || nv as usize >= bound {
        None
    } else {
        Some(nv as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_gets_one_label() {
        let mut vol = Array3::<u8>::zeros((10, 10, 1));
        for x in 2..6 {
            for y in 3..7 {
                vol[[x, y, 0]] = 1;
            }
        }
        let (labels, n) = BackgroundAwareLabeler.label_chunk(&vol);
        assert_eq!(n, 1);
        assert_eq!(labels[[2, 3, 0]], labels[[5, 6, 0]]);
        assert_eq!(labels[[0, 0, 0]], 0);
    }

    #[test]
    fn disjoint_blocks_get_distinct_labels() {
        let mut vol = Array3::<u8>::zeros((10, 1, 1));
        vol[[0, 0, 0]] = 1;
        vol[[1, 0, 0]] = 1;
        vol[[8, 0, 0]] = 1;
        vol[[9, 0, 0]] = 1;
        let (labels, n) = BackgroundAwareLabeler.label_chunk(&vol);
        assert_eq!(n, 2);
        assert_ne!(labels[[0, 0, 0]], labels[[9, 0, 0]]);
        assert_eq!(labels[[0, 0, 0]], labels[[1, 0, 0]]);
    }

    #[test]
    fn adjacent_voxels_of_different_nonzero_value_are_distinct_components() {
        let mut vol = Array3::<u8>::zeros((4, 1, 1));
        vol[[0, 0, 0]] = 5;
        vol[[1, 0, 0]] = 5;
        vol[[2, 0, 0]] = 7;
        vol[[3, 0, 0]] = 7;
        let (labels, n) = BackgroundAwareLabeler.label_chunk(&vol);
        assert_eq!(n, 2);
        assert_eq!(labels[[0, 0, 0]], labels[[1, 0, 0]]);
        assert_eq!(labels[[2, 0, 0]], labels[[3, 0, 0]]);
        assert_ne!(labels[[1, 0, 0]], labels[[2, 0, 0]]);
    }
}
