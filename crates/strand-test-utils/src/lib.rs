//! Test utilities and mock kernels for Strand development.
//!
//! Provides coordinate-encoded global fields, a writer for
//! initial-condition containers, and the mock kernels in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::path::Path;

use strand_core::{GridDims, Params, MAX_DIMS};
use strand_store::{CheckpointStore, OpenMode, StoreError};

pub use fixtures::{CallCounts, CountingKernel, FailPoint, FailingKernel};

/// Encode a global coordinate as a single value.
///
/// Each axis gets three decimal digits, so grids up to 1000 cells per
/// axis round-trip exactly.
pub fn encode_coord(coord: [usize; MAX_DIMS]) -> f64 {
    (coord[0] * 1_000_000 + coord[1] * 1_000 + coord[2]) as f64
}

/// A global field whose every cell holds [`encode_coord`] of itself,
/// plus `offset`.
pub fn coordinate_field(global: &GridDims, offset: f64) -> Vec<f64> {
    let n = global.padded();
    let mut values = Vec::with_capacity(global.volume());
    for i in 0..n[0] {
        for j in 0..n[1] {
            for k in 0..n[2] {
                values.push(encode_coord([i, j, k]) + offset);
            }
        }
    }
    values
}

/// Write an initial-condition container with one top-level dataset per
/// `(name, values)` pair.
pub fn write_initial(
    path: impl AsRef<Path>,
    global: GridDims,
    fields: &[(&str, Vec<f64>)],
) -> Result<(), StoreError> {
    let mut store = CheckpointStore::open(path, OpenMode::Create { dims: global })?;
    for (name, values) in fields {
        store.write_dataset(name, values)?;
    }
    store.close()
}

/// Parameters from `key, value` pairs.
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs.iter().copied().collect()
}
