//! Explicit mobility-weighted diffusion.

use strand_core::Params;
use strand_kernel::{Kernel, KernelError, KernelState};

use crate::positive;
use crate::stencil::{laplacian, max_stable_dt, relax};

/// Forward-Euler diffusion of every tracked field.
///
/// Each step computes, over the interior:
/// ```text
/// mu  = -lap(phi)
/// phi = phi - dt * M * mu
/// ```
/// with `M` taken from the mobility buffers, which
/// [`preprocess`](Kernel::preprocess) fills with the `mobility`
/// parameter. The step is rejected up front unless
/// `dt * M / dx^2 <= 1 / (2 * ndim)`.
///
/// Parameters: `dt`, `dx`, `mobility`.
///
/// ```
/// use strand_kernels::Diffusion;
///
/// let kernel = Diffusion::builder().dt(0.05).mobility(2.0).build().unwrap();
/// assert_eq!(kernel.max_dt(2), 0.125);
/// ```
#[derive(Clone, Debug)]
pub struct Diffusion {
    dt: f64,
    dx: f64,
    mobility: f64,
}

/// Builder for [`Diffusion`].
///
/// Defaults: `dt = 0.1`, `dx = 1`, `mobility = 1`.
pub struct DiffusionBuilder {
    dt: f64,
    dx: f64,
    mobility: f64,
}

impl Diffusion {
    /// Create a new builder.
    pub fn builder() -> DiffusionBuilder {
        DiffusionBuilder {
            dt: 0.1,
            dx: 1.0,
            mobility: 1.0,
        }
    }

    /// Time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Grid spacing.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Uniform mobility.
    pub fn mobility(&self) -> f64 {
        self.mobility
    }

    /// Largest stable time step on an `ndim`-axis grid.
    pub fn max_dt(&self, ndim: usize) -> f64 {
        max_stable_dt(ndim, self.dx, self.mobility)
    }
}

impl Default for Diffusion {
    fn default() -> Self {
        Self {
            dt: 0.1,
            dx: 1.0,
            mobility: 1.0,
        }
    }
}

impl DiffusionBuilder {
    /// Time step.
    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Grid spacing.
    pub fn dx(mut self, dx: f64) -> Self {
        self.dx = dx;
        self
    }

    /// Uniform mobility.
    pub fn mobility(mut self, mobility: f64) -> Self {
        self.mobility = mobility;
        self
    }

    /// Build the kernel.
    ///
    /// Every coefficient must be finite and positive.
    pub fn build(self) -> Result<Diffusion, String> {
        for (name, value) in [("dt", self.dt), ("dx", self.dx), ("mobility", self.mobility)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be finite and > 0, got {value}"));
            }
        }
        Ok(Diffusion {
            dt: self.dt,
            dx: self.dx,
            mobility: self.mobility,
        })
    }
}

impl Kernel for Diffusion {
    fn name(&self) -> &str {
        "diffusion"
    }

    fn preprocess(
        &mut self,
        state: &mut KernelState<'_>,
        params: &Params,
    ) -> Result<(), KernelError> {
        self.dt = positive(params, "dt", self.dt)?;
        self.dx = positive(params, "dx", self.dx)?;
        self.mobility = positive(params, "mobility", self.mobility)?;

        let ghost = state.layout().ghost();
        if ghost < self.min_ghost_width() {
            return Err(KernelError::GhostTooNarrow {
                required: self.min_ghost_width(),
                found: ghost,
            });
        }
        let limit = self.max_dt(state.layout().ndim());
        if self.dt > limit {
            return Err(KernelError::Unstable {
                reason: format!("dt = {} exceeds the diffusion limit {limit}", self.dt),
            });
        }

        state.mobility_mut().fill(self.mobility);
        state.chem_pot_mut().fill(0.0);
        Ok(())
    }

    fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        let layout = *state.layout();
        let (fields, chem_pot, mobility) = state.split_mut();
        for f in 0..fields.count() {
            let mu = chem_pot.field_mut(f);
            laplacian(&layout, fields.field(f), self.dx, mu);
            layout.for_each_interior(|_, idx| mu[idx] = -mu[idx]);
            relax(
                &layout,
                fields.field_mut(f),
                chem_pot.field(f),
                mobility.field(f),
                self.dt,
            );
        }
        state.check_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::buffers;

    #[test]
    fn builder_rejects_bad_coefficients() {
        assert!(Diffusion::builder().dt(0.0).build().is_err());
        assert!(Diffusion::builder().dx(f64::NAN).build().is_err());
        assert!(Diffusion::builder().mobility(-1.0).build().is_err());
    }

    #[test]
    fn params_override_builder_values() {
        let mut b = buffers(&[4], 1, &["phi"]);
        let params: Params = [("dt", "0.2"), ("mobility", "0.5")].into_iter().collect();
        let mut kernel = Diffusion::default();
        kernel.preprocess(&mut b.state(0), &params).unwrap();
        assert_eq!(kernel.dt(), 0.2);
        assert_eq!(kernel.mobility(), 0.5);
        assert_eq!(kernel.dx(), 1.0);
        assert!(b.mobility.as_slice().iter().all(|&m| m == 0.5));
    }

    #[test]
    fn unstable_step_is_rejected() {
        let mut b = buffers(&[4, 4], 1, &["phi"]);
        let params: Params = [("dt", "0.3")].into_iter().collect();
        let err = Diffusion::default()
            .preprocess(&mut b.state(0), &params)
            .unwrap_err();
        assert!(matches!(err, KernelError::Unstable { .. }), "{err}");
    }

    #[test]
    fn invalid_parameter_is_reported() {
        let mut b = buffers(&[4], 1, &["phi"]);
        let params: Params = [("dx", "-1")].into_iter().collect();
        let err = Diffusion::default()
            .preprocess(&mut b.state(0), &params)
            .unwrap_err();
        assert!(matches!(err, KernelError::Params(_)), "{err}");
    }

    #[test]
    fn zero_ghost_width_is_rejected() {
        let mut b = buffers(&[4], 0, &["phi"]);
        let err = Diffusion::default()
            .preprocess(&mut b.state(0), &Params::new())
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::GhostTooNarrow {
                required: 1,
                found: 0
            }
        ));
    }

    #[test]
    fn spike_spreads_to_neighbours() {
        let mut b = buffers(&[5], 1, &["phi"]);
        b.fields.field_mut(0)[3] = 1.0;
        let mut kernel = Diffusion::builder().dt(0.25).build().unwrap();
        kernel.preprocess(&mut b.state(0), &Params::new()).unwrap();
        kernel.apply(&mut b.state(1)).unwrap();

        let phi = b.fields.field(0);
        assert_eq!(&phi[1..6], &[0.0, 0.25, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn uniform_field_is_steady() {
        let mut b = buffers(&[3, 4], 1, &["phi", "c"]);
        b.fields.fill(0.7);
        let mut kernel = Diffusion::default();
        kernel.preprocess(&mut b.state(0), &Params::new()).unwrap();
        for step in 1..=5 {
            kernel.apply(&mut b.state(step)).unwrap();
        }
        assert!(b.fields.as_slice().iter().all(|&v| v == 0.7));
    }

    #[test]
    fn non_finite_result_is_an_error() {
        let mut b = buffers(&[3], 1, &["phi"]);
        b.fields.field_mut(0)[2] = f64::NAN;
        let mut kernel = Diffusion::default();
        kernel.preprocess(&mut b.state(0), &Params::new()).unwrap();
        let err = kernel.apply(&mut b.state(1)).unwrap_err();
        assert!(matches!(err, KernelError::NonFinite { .. }), "{err}");
    }
}
