//! Reference kernels for Strand simulations.
//!
//! Both kernels relax each field towards lower free energy with the
//! explicit update `phi -= dt * M * mu`, where `M` is the per-cell
//! mobility and `mu` the driving force they write to the
//! chemical-potential buffers:
//!
//! - [`Diffusion`]: `mu = -lap(phi)`, so `phi` obeys the heat equation.
//! - [`AllenCahn`]: `mu = f'(phi) - kappa * lap(phi)` with the double
//!   well `f(phi) = W phi^2 (1 - phi)^2`.
//!
//! Coefficients are read from the run parameters during
//! [`preprocess`](strand_kernel::Kernel::preprocess); keys that are
//! absent keep the values the kernel was constructed with.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod allen_cahn;
pub mod diffusion;
pub mod stencil;

pub use allen_cahn::AllenCahn;
pub use diffusion::{Diffusion, DiffusionBuilder};

use strand_core::{Params, ParamsError};
use strand_kernel::KernelError;

/// Read `key` as a finite, strictly positive coefficient.
pub(crate) fn positive(params: &Params, key: &str, default: f64) -> Result<f64, KernelError> {
    let value: f64 = params.parse_or(key, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParamsError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be finite and > 0".to_string(),
        }
        .into())
    }
}
