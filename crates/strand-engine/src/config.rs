//! Run configuration, validation, and error types.
//!
//! [`RunConfig`] is read from the run's [`Params`] and checked with
//! [`validate()`](RunConfig::validate) before any collective work, so a
//! bad parameter file fails identically on every rank.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use strand_core::{GridDims, Params, ParamsError, MAX_DIMS};
use strand_decomp::{BoundaryPolicy, DecompConfig};

use crate::progress::progress_interval;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building or validating a [`RunConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// A parameter is missing or unparsable.
    Params(ParamsError),
    /// `nsteps` is zero.
    NoSteps,
    /// `output_frequency` is zero.
    ZeroOutputFrequency,
    /// `dimensions` is outside 1 to 3.
    InvalidDimensions {
        /// The configured value.
        value: usize,
    },
    /// `process_grid` has the wrong number of entries.
    ProcessGridLength {
        /// Configured dimensionality.
        expected: usize,
        /// Entries given.
        found: usize,
    },
    /// `boundary` is not a recognised policy.
    InvalidBoundary {
        /// The configured value.
        value: String,
    },
    /// `ghost_width` is narrower than the kernel's stencil.
    GhostTooNarrow {
        /// The kernel's minimum.
        required: usize,
        /// The configured width.
        configured: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Params(e) => write!(f, "parameters: {e}"),
            Self::NoSteps => write!(f, "nsteps must be at least 1"),
            Self::ZeroOutputFrequency => write!(f, "output_frequency must be at least 1"),
            Self::InvalidDimensions { value } => {
                write!(f, "dimensions must be 1 to {MAX_DIMS}, got {value}")
            }
            Self::ProcessGridLength { expected, found } => write!(
                f,
                "process_grid has {found} entries, dimensions is {expected}"
            ),
            Self::InvalidBoundary { value } => write!(
                f,
                "boundary must be periodic, reflect, or fixed:<value>, got '{value}'"
            ),
            Self::GhostTooNarrow {
                required,
                configured,
            } => write!(
                f,
                "ghost_width {configured} is below the kernel's minimum of {required}"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Params(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamsError> for ConfigError {
    fn from(e: ParamsError) -> Self {
        Self::Params(e)
    }
}

// ── RunConfig ──────────────────────────────────────────────────────

/// Default checkpoint container path.
pub const DEFAULT_CHECKPOINT_FILE: &str = "strand.chk";

/// Everything the driver needs from the parameter file.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Initial-condition container. Key `init_file`, required.
    pub init_file: PathBuf,
    /// Number of steps. Key `nsteps`, required.
    pub nsteps: u64,
    /// Steps between checkpoints. Key `output_frequency`, required.
    pub output_frequency: u64,
    /// Checkpoint container. Key `checkpoint_file`, default `strand.chk`.
    pub checkpoint_file: PathBuf,
    /// Simulation dimensionality. Key `dimensions`, default 2.
    pub dimensions: usize,
    /// Ghost width. Key `ghost_width`, default 1.
    pub ghost_width: usize,
    /// Requested process grid, `0` = free. Key `process_grid`, default
    /// all free.
    pub process_grid: Vec<usize>,
    /// Edge policy for halo exchange. Key `boundary`, default periodic.
    pub boundary: BoundaryPolicy,
}

impl RunConfig {
    /// Read the configuration from `params`.
    ///
    /// Only parsing happens here; call [`validate`](Self::validate) to
    /// check ranges.
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let boundary = match params.get("boundary") {
            None => BoundaryPolicy::default(),
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidBoundary {
                value: raw.to_string(),
            })?,
        };
        Ok(Self {
            init_file: PathBuf::from(params.require("init_file")?),
            nsteps: params.parse("nsteps")?,
            output_frequency: params.parse("output_frequency")?,
            checkpoint_file: PathBuf::from(
                params
                    .get("checkpoint_file")
                    .unwrap_or(DEFAULT_CHECKPOINT_FILE),
            ),
            dimensions: params.parse_or("dimensions", 2)?,
            ghost_width: params.parse_or("ghost_width", 1)?,
            process_grid: params.parse_list("process_grid")?,
            boundary,
        })
    }

    /// Check ranges, and that the ghost layer is wide enough for a
    /// kernel needing `min_ghost_width`.
    pub fn validate(&self, min_ghost_width: usize) -> Result<(), ConfigError> {
        if self.nsteps == 0 {
            return Err(ConfigError::NoSteps);
        }
        if self.output_frequency == 0 {
            return Err(ConfigError::ZeroOutputFrequency);
        }
        if !(1..=MAX_DIMS).contains(&self.dimensions) {
            return Err(ConfigError::InvalidDimensions {
                value: self.dimensions,
            });
        }
        if !self.process_grid.is_empty() && self.process_grid.len() != self.dimensions {
            return Err(ConfigError::ProcessGridLength {
                expected: self.dimensions,
                found: self.process_grid.len(),
            });
        }
        if self.ghost_width < min_ghost_width {
            return Err(ConfigError::GhostTooNarrow {
                required: min_ghost_width,
                configured: self.ghost_width,
            });
        }
        Ok(())
    }

    /// Steps between progress reports, if any.
    pub fn progress_interval(&self) -> Option<u64> {
        progress_interval(self.nsteps)
    }

    /// Number of checkpoints a complete run writes, including step 0.
    pub fn checkpoint_count(&self) -> u64 {
        1 + self.nsteps / self.output_frequency.max(1)
    }

    /// Decomposition inputs for a global grid of `global`.
    pub fn decomp_config(&self, global: GridDims) -> DecompConfig {
        let config = DecompConfig::new(global, self.ghost_width)
            .with_process_grid(&self.process_grid)
            .with_boundary(self.boundary);
        DecompConfig {
            ndim: self.dimensions,
            ..config
        }
    }
}
