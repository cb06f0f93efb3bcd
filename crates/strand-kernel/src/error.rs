//! Kernel errors.

use std::error::Error;
use std::fmt;

use strand_core::ParamsError;

/// Errors reported by a [`Kernel`](crate::Kernel).
#[derive(Debug)]
pub enum KernelError {
    /// The kernel's step failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A kernel parameter is missing or unparsable.
    Params(ParamsError),
    /// The parameters describe an unstable or meaningless update.
    Unstable {
        /// Description of the violated condition.
        reason: String,
    },
    /// The ghost layer is narrower than the kernel's stencil.
    GhostTooNarrow {
        /// Width the stencil needs.
        required: usize,
        /// Configured width.
        found: usize,
    },
    /// A field holds a NaN or infinite value after a step.
    NonFinite {
        /// Field name.
        field: String,
        /// Buffer index of the first bad cell.
        cell: usize,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::Params(e) => write!(f, "kernel parameter: {e}"),
            Self::Unstable { reason } => write!(f, "unstable configuration: {reason}"),
            Self::GhostTooNarrow { required, found } => write!(
                f,
                "stencil needs ghost width {required}, configured width is {found}"
            ),
            Self::NonFinite { field, cell } => {
                write!(f, "non-finite value in field '{field}' at cell {cell}")
            }
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Params(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParamsError> for KernelError {
    fn from(e: ParamsError) -> Self {
        Self::Params(e)
    }
}
