//! Decomposition errors.

use std::error::Error;
use std::fmt;

use strand_comm::CommError;
use strand_core::DimsError;

/// Errors from setting up a decomposition or running its collectives.
#[derive(Clone, Debug, PartialEq)]
pub enum DecompError {
    /// The requested process grid, the global grid, and the configured
    /// dimensionality disagree on the number of axes.
    DimensionalityMismatch {
        /// Axes of the requested process grid or global grid.
        grid: usize,
        /// Configured field dimensionality.
        field: usize,
    },
    /// No process grid with the requested shape covers the group.
    InvalidProcessGrid {
        /// Group size.
        nprocs: usize,
        /// Requested grid, `0` marking free axes.
        requested: Vec<usize>,
        /// Why the request cannot be met.
        reason: String,
    },
    /// An axis has fewer cells than processes, leaving a subdomain empty.
    EmptySubdomain {
        /// Offending axis.
        axis: usize,
        /// Global extent of the axis.
        global: usize,
        /// Processes along the axis.
        procs: usize,
    },
    /// A subdomain is thinner than the ghost layer along an axis.
    SubdomainThinnerThanHalo {
        /// Offending axis.
        axis: usize,
        /// Smallest local extent along the axis.
        local: usize,
        /// Configured ghost width.
        ghost: usize,
    },
    /// A buffer passed to a collective has the wrong length.
    BufferSize {
        /// Which buffer.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        found: usize,
    },
    /// The coordinator called scatter or gather without a global buffer.
    MissingGlobal,
    /// A boundary policy string could not be parsed.
    InvalidBoundary {
        /// The rejected text.
        value: String,
    },
    /// Grid extents were invalid.
    Dims(DimsError),
    /// Communication failed.
    Comm(CommError),
}

impl fmt::Display for DecompError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionalityMismatch { grid, field } => write!(
                f,
                "dimensionality mismatch: grid has {grid} axes, fields have {field}"
            ),
            Self::InvalidProcessGrid {
                nprocs,
                requested,
                reason,
            } => write!(
                f,
                "cannot arrange {nprocs} processes as {requested:?}: {reason}"
            ),
            Self::EmptySubdomain {
                axis,
                global,
                procs,
            } => write!(
                f,
                "axis {axis} has {global} cells for {procs} processes; a subdomain would be empty"
            ),
            Self::SubdomainThinnerThanHalo { axis, local, ghost } => write!(
                f,
                "subdomain has {local} cells along axis {axis}, fewer than ghost width {ghost}"
            ),
            Self::BufferSize {
                what,
                expected,
                found,
            } => write!(f, "{what} buffer has {found} values, expected {expected}"),
            Self::MissingGlobal => write!(f, "coordinator has no global buffer"),
            Self::InvalidBoundary { value } => write!(
                f,
                "unknown boundary policy '{value}' (expected periodic, reflect, or fixed:<value>)"
            ),
            Self::Dims(e) => write!(f, "invalid grid: {e}"),
            Self::Comm(e) => write!(f, "communication failed: {e}"),
        }
    }
}

impl Error for DecompError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dims(e) => Some(e),
            Self::Comm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DimsError> for DecompError {
    fn from(e: DimsError) -> Self {
        Self::Dims(e)
    }
}

impl From<CommError> for DecompError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}
