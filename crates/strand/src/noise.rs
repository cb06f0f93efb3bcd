//! Seeded initial conditions.
//!
//! Writes an initial-condition container whose fields hold uniform
//! noise around a mean. The generator is ChaCha8, so a seed always
//! produces the same container.

use std::error::Error;
use std::fmt;
use std::path::Path;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strand_core::{GridDims, NameError, NameIndex};
use strand_store::{CheckpointStore, OpenMode, StoreError};

/// Noise parameters: values are drawn uniformly from
/// `[mean - amplitude, mean + amplitude)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSpec {
    /// Centre of the distribution.
    pub mean: f64,
    /// Half-width of the distribution.
    pub amplitude: f64,
    /// Generator seed.
    pub seed: u64,
}

impl Default for NoiseSpec {
    fn default() -> Self {
        Self {
            mean: 0.5,
            amplitude: 0.01,
            seed: 0,
        }
    }
}

impl NoiseSpec {
    /// `count` noise values, continuing `rng`'s stream.
    fn sample(&self, rng: &mut ChaCha8Rng, count: usize) -> Vec<f64> {
        (0..count)
            .map(|_| {
                let unit = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
                self.mean + self.amplitude * (2.0 * unit - 1.0)
            })
            .collect()
    }
}

/// Errors from [`write_noise_initial`].
#[derive(Debug)]
pub enum InitError {
    /// A field name was empty, too long, or repeated.
    Name(NameError),
    /// The container could not be written.
    Store(StoreError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(e) => write!(f, "invalid field name: {e}"),
            Self::Store(e) => write!(f, "cannot write initial conditions: {e}"),
        }
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Name(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<NameError> for InitError {
    fn from(e: NameError) -> Self {
        Self::Name(e)
    }
}

impl From<StoreError> for InitError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Create `path` with one top-level dataset of noise per name.
///
/// Fields draw from one generator in name order, so the first field's
/// values do not depend on how many fields follow it.
pub fn write_noise_initial<S: AsRef<str>>(
    path: impl AsRef<Path>,
    global: GridDims,
    names: &[S],
    spec: &NoiseSpec,
) -> Result<(), InitError> {
    let names = NameIndex::from_strings(names)?;
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    let mut store = CheckpointStore::open(path, OpenMode::Create { dims: global })?;
    for (_, name) in names.iter() {
        let values = spec.sample(&mut rng, global.volume());
        store.write_dataset(name.as_str(), &values)?;
    }
    store.close()?;
    Ok(())
}
