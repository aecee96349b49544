/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Dynamic dispatch over the three supported input element types.
//!
//! The core operates exclusively on `u32` local labels (see
//! [`crate::label`]); this module is the boundary where a concrete `u8`,
//! `u32`, or `u64` input provider and labeler pair is type-erased into
//! whatever [`crate::Engine`] needs, mirroring `lazycc/__init__.py`'s
//! dtype-keyed dispatch to `UnionFindUInt8`/`UnionFindUInt32`/
//! `UnionFindUInt64` in the original.

use crate::label::LabelChunk;
use crate::store::InputProvider;
use std::sync::Arc;

/// An element type accepted as volume input, per spec §6. `0` is always
/// background (`Default::default()`).
pub trait VoxelValue: Copy + Eq + Default + Send + Sync + 'static {}
impl VoxelValue for u8 {}
impl VoxelValue for u32 {}
impl VoxelValue for u64 {}

/// A type-erased `(input provider, labeling primitive)` pair, bundled
/// together so the element width they agree on can't drift apart across the
/// [`crate::Engine::new`] boundary.
pub enum TypedInput {
    U8 {
        input: Arc<dyn InputProvider<u8>>,
        labeler: Arc<dyn LabelChunk<u8>>,
    },
    U32 {
        input: Arc<dyn InputProvider<u32>>,
        labeler: Arc<dyn LabelChunk<u32>>,
    },
    U64 {
        input: Arc<dyn InputProvider<u64>>,
        labeler: Arc<dyn LabelChunk<u64>>,
    },
}

impl TypedInput {
    pub fn u8(input: Arc<dyn InputProvider<u8>>, labeler: Arc<dyn LabelChunk<u8>>) -> Self {
        TypedInput::U8 { input, labeler }
    }

    pub fn u32(input: Arc<dyn InputProvider<u32>>, labeler: Arc<dyn LabelChunk<u32>>) -> Self {
        TypedInput::U32 { input, labeler }
    }

    pub fn u64(input: Arc<dyn InputProvider<u64>>, labeler: Arc<dyn LabelChunk<u64>>) -> Self {
        TypedInput::U64 { input, labeler }
    }

    /// The element type's name, for error messages and logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedInput::U8 { .. } => "u8",
            TypedInput::U32 { .. } => "u32",
            TypedInput::U64 { .. } => "u64",
        }
    }

    /// The input volume's shape, per the wrapped provider.
    pub fn shape(&self) -> [u64; 3] {
        match self {
            TypedInput::U8 { input, .. } => input.shape(),
            TypedInput::U32 { input, .. } => input.shape(),
            TypedInput::U64 { input, .. } => input.shape(),
        }
    }
}
