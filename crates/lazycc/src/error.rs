/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use thiserror::Error;

/// Errors produced by the engine.
///
/// `UnsupportedDtype` and `ShapeMismatch` are setup-time errors: they are
/// returned from [`crate::Engine::new`] and mean the caller configured the
/// engine incorrectly. `IoUpstream` and `Internal` can surface from any
/// [`crate::Engine::compute`] call; neither invalidates cached state, since
/// every mutation the engine performs is monotonic (see spec module docs).
#[derive(Error, Debug)]
pub enum Error {
    /// The input element type is not one of the three supported unsigned
    /// integer widths.
    #[error("unsupported input element type (expected u8, u32, or u64)")]
    UnsupportedDtype,

    /// `chunk_shape`'s dimensionality does not match the input's.
    #[error("chunk_shape has {got} dimensions, input has {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    /// The input provider or chunk store failed to read or write.
    #[error("I/O failure reading/writing chunk data")]
    IoUpstream(#[source] anyhow::Error),

    /// An internal invariant was violated. Reaching this is a bug in this
    /// crate, not a caller mistake.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
