/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use crate::error::{Error, Result};

/// Engine configuration (spec §6: "the recognized options").
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// The spatial extent of one chunk, in voxels along x, y, z.
    pub chunk_shape: [u32; 3],
}

impl EngineConfig {
    pub fn new(chunk_shape: [u32; 3]) -> Self {
        Self { chunk_shape }
    }

    /// Validates that every `chunk_shape` axis extent is positive.
    ///
    /// There is no dimensionality to check here: every [`InputProvider`]
    /// reports a `[u64; 3]` shape and `chunk_shape` is itself `[u32; 3]`, so
    /// the two are always rank-3 by construction — a would-be
    /// `ShapeMismatch` between them is not representable, let alone
    /// reachable. `ShapeMismatch` remains a real [`Error`] variant for a
    /// caller-facing dtype/shape layer built on top of this crate (e.g. one
    /// that accepts input rank as a runtime value before erasing it into an
    /// [`InputProvider`]), it just isn't this function's job to raise it.
    ///
    /// [`InputProvider`]: crate::store::InputProvider
    pub(crate) fn validate(&self) -> Result<()> {
        if self.chunk_shape.iter().any(|&c| c == 0) {
            return Err(Error::Internal(
                "chunk_shape axes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
