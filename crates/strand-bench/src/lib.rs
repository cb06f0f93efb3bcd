//! Benchmark profiles and utilities for the Strand simulation framework.
//!
//! Provides pre-built [`BenchProfile`]s for the decomposition and
//! stencil benchmarks:
//!
//! - [`BenchProfile::square`]: 256x256 grid (~65K cells) on 4 ranks
//! - [`BenchProfile::cube`]: 64x64x64 grid (~262K cells) on 8 ranks
//! - [`seeded_field`]: deterministic pseudo-random field values

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strand_core::GridDims;
use strand_decomp::DecompConfig;

/// A grid, a group size, and a ghost width to benchmark against.
#[derive(Clone, Copy, Debug)]
pub struct BenchProfile {
    /// Human-readable name used as the benchmark id.
    pub name: &'static str,
    /// Global interior extents.
    pub global: GridDims,
    /// Number of ranks.
    pub nprocs: usize,
    /// Ghost width on every decomposed axis.
    pub ghost: usize,
}

impl BenchProfile {
    /// 256x256 grid on 4 ranks with one ghost layer.
    pub fn square() -> Self {
        Self {
            name: "square_256x256_np4",
            global: dims(&[256, 256]),
            nprocs: 4,
            ghost: 1,
        }
    }

    /// 64x64x64 grid on 8 ranks with one ghost layer.
    pub fn cube() -> Self {
        Self {
            name: "cube_64x64x64_np8",
            global: dims(&[64, 64, 64]),
            nprocs: 8,
            ghost: 1,
        }
    }

    /// Decomposition settings for this profile (periodic boundaries).
    pub fn decomp_config(&self) -> DecompConfig {
        DecompConfig::new(self.global, self.ghost)
    }
}

fn dims(extent: &[usize]) -> GridDims {
    match GridDims::new(extent) {
        Ok(dims) => dims,
        Err(e) => panic!("invalid benchmark extents {extent:?}: {e}"),
    }
}

/// Deterministic values in `[0, 1)` for every cell of `global`.
pub fn seeded_field(global: &GridDims, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..global.volume())
        .map(|_| (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_field_is_reproducible_and_in_range() {
        let global = GridDims::new(&[8, 8]).unwrap();
        let a = seeded_field(&global, 7);
        assert_eq!(a, seeded_field(&global, 7));
        assert_ne!(a, seeded_field(&global, 8));
        assert!(a.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn profiles_divide_evenly() {
        for profile in [BenchProfile::square(), BenchProfile::cube()] {
            assert_eq!(profile.decomp_config().global, profile.global);
            assert!(profile.global.volume() % profile.nprocs == 0);
        }
    }
}
