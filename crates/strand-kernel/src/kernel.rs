//! The kernel trait.

use strand_core::Params;

use crate::error::KernelError;
use crate::state::KernelState;

/// A physics update that advances every tracked field by one step.
///
/// The driver calls [`preprocess`](Kernel::preprocess) once before the
/// first step, [`apply`](Kernel::apply) once per step, and
/// [`postprocess`](Kernel::postprocess) once after the last step. All
/// three see the same rank-local buffers. A kernel only touches its own
/// rank's subdomain; ghost cells are refreshed by the driver between
/// steps, so a stencil wider than [`min_ghost_width`](Kernel::min_ghost_width)
/// reads stale data.
///
/// Every rank owns its own kernel instance. `Send` lets the in-process
/// backend move a kernel onto its rank thread.
///
/// # Example
///
/// ```
/// use strand_core::Params;
/// use strand_kernel::{Kernel, KernelError, KernelState};
///
/// struct Decay {
///     rate: f64,
/// }
///
/// impl Kernel for Decay {
///     fn name(&self) -> &str {
///         "decay"
///     }
///
///     fn min_ghost_width(&self) -> usize {
///         0
///     }
///
///     fn preprocess(
///         &mut self,
///         _state: &mut KernelState<'_>,
///         params: &Params,
///     ) -> Result<(), KernelError> {
///         self.rate = params.parse_or("rate", self.rate)?;
///         Ok(())
///     }
///
///     fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
///         let keep = 1.0 - self.rate;
///         for field in state.fields_mut().fields_mut() {
///             field.iter_mut().for_each(|v| *v *= keep);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Kernel: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Ghost width the kernel's stencil needs. Defaults to 1.
    fn min_ghost_width(&self) -> usize {
        1
    }

    /// Read parameters and initialise chemical potentials and
    /// mobilities. Runs once after the initial halo exchange.
    fn preprocess(
        &mut self,
        _state: &mut KernelState<'_>,
        _params: &Params,
    ) -> Result<(), KernelError> {
        Ok(())
    }

    /// Advance the fields by one step, in place.
    fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError>;

    /// Runs once after the last step.
    fn postprocess(&mut self, _state: &mut KernelState<'_>) -> Result<(), KernelError> {
        Ok(())
    }
}

impl<K: Kernel + ?Sized> Kernel for Box<K> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn min_ghost_width(&self) -> usize {
        (**self).min_ghost_width()
    }

    fn preprocess(
        &mut self,
        state: &mut KernelState<'_>,
        params: &Params,
    ) -> Result<(), KernelError> {
        (**self).preprocess(state, params)
    }

    fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        (**self).apply(state)
    }

    fn postprocess(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        (**self).postprocess(state)
    }
}
