/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Component B (external): the chunk store, plus the input provider seam.
//!
//! Spec §1 treats both as black boxes ("a keyed container of 3D arrays of
//! label ids supporting slice read/write"); only the trait shapes matter.
//! [`MemoryInput`] and [`MemoryStore`] are reference implementations for
//! tests and demos, grounded in `_opLazyCC.py`'s use of
//! `self.Input.get(roi).wait()` / `OpCompressedCache`.

use crate::dtype::VoxelValue;
use crate::error::{Error, Result};
use crate::geometry::{ChunkCoord, Region};
use ndarray::{s, Array3};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Supplies raw voxel data for a region of the input volume.
pub trait InputProvider<T: VoxelValue>: Send + Sync {
    /// The full extent of the input volume, in voxels along x, y, z. Used to
    /// build the [`crate::geometry::ChunkGrid`] at setup time.
    fn shape(&self) -> [u64; 3];

    fn read_region(&self, region: &Region) -> Result<Array3<T>>;
}

/// The compressed chunk store: a keyed container of per-chunk local-label
/// arrays, addressed in chunk-local voxel coordinates (`[0, chunk_shape)`,
/// clipped for partial trailing chunks).
pub trait ChunkStore: Send + Sync {
    fn write_chunk(&self, coord: ChunkCoord, labels: Array3<u32>) -> Result<()>;

    /// Reads a sub-volume of one chunk's labels, in chunk-local coordinates.
    fn read_slab(&self, coord: ChunkCoord, local_region: &Region) -> Result<Array3<u32>>;

    /// Drops all stored chunks. Called by [`crate::Engine::invalidate`]; per
    /// spec §9 ("reset vs. reuse" is unconstrained) this reference store
    /// resets, see DESIGN.md.
    fn clear(&self);
}

/// An in-memory [`InputProvider`] over a whole dense volume, for tests and
/// demos.
pub struct MemoryInput<T> {
    data: Array3<T>,
}

impl<T: VoxelValue> MemoryInput<T> {
    pub fn new(data: Array3<T>) -> Self {
        Self { data }
    }
}

impl<T: VoxelValue> InputProvider<T> for MemoryInput<T> {
    fn shape(&self) -> [u64; 3] {
        let (x, y, z) = self.data.dim();
        [x as u64, y as u64, z as u64]
    }

    fn read_region(&self, region: &Region) -> Result<Array3<T>> {
        let s = region.start;
        let e = region.stop;
        let view = self.data.slice(s![
            s[0] as usize..e[0] as usize,
            s[1] as usize..e[1] as usize,
            s[2] as usize..e[2] as usize,
        ]);
        Ok(view.to_owned())
    }
}

/// Wraps an [`InputProvider`] and counts calls to `read_region`, used to
/// check the laziness upper bound (spec §8 property 3 / scenario 3),
/// grounded in `test/testOpLazyCC.py::testLazyness`'s `OpExecuteCounter`.
pub struct CountingInput<T: VoxelValue> {
    inner: Box<dyn InputProvider<T>>,
    count: AtomicUsize,
}

impl<T: VoxelValue> CountingInput<T> {
    pub fn new(inner: impl InputProvider<T> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            count: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl<T: VoxelValue> InputProvider<T> for CountingInput<T> {
    fn shape(&self) -> [u64; 3] {
        self.inner.shape()
    }

    fn read_region(&self, region: &Region) -> Result<Array3<T>> {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.inner.read_region(region)
    }
}

/// An in-memory [`ChunkStore`], keyed by chunk coordinate.
#[derive(Default)]
pub struct MemoryStore {
    chunks: Mutex<HashMap<ChunkCoord, Array3<u32>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkStore for MemoryStore {
    fn write_chunk(&self, coord: ChunkCoord, labels: Array3<u32>) -> Result<()> {
        self.chunks.lock().unwrap().insert(coord, labels);
        Ok(())
    }

    fn read_slab(&self, coord: ChunkCoord, local_region: &Region) -> Result<Array3<u32>> {
        let chunks = self.chunks.lock().unwrap();
        let chunk = chunks.get(&coord).ok_or_else(|| {
            Error::Internal(format!("chunk {coord} read before being labeled"))
        })?;
        let s = local_region.start;
        let e = local_region.stop;
        Ok(chunk
            .slice(s![
                s[0] as usize..e[0] as usize,
                s[1] as usize..e[1] as usize,
                s[2] as usize..e[2] as usize,
            ])
            .to_owned())
    }

    fn clear(&self) {
        self.chunks.lock().unwrap().clear();
    }
}
