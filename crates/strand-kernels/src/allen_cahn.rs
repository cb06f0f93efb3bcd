//! Non-conserved phase-field relaxation.

use strand_core::Params;
use strand_kernel::{Kernel, KernelError, KernelState};

use crate::positive;
use crate::stencil::{laplacian, max_stable_dt, relax};

/// Allen-Cahn relaxation of every tracked field in a double-well
/// potential with minima at 0 and 1.
///
/// ```text
/// f'(phi) = 2 W phi (1 - phi) (1 - 2 phi)
/// mu      = f'(phi) - kappa * lap(phi)
/// phi     = phi - dt * M * mu
/// ```
///
/// Parameters: `dt`, `dx`, `mobility`, `kappa` (gradient energy) and
/// `barrier` (well height `W`).
#[derive(Clone, Debug)]
pub struct AllenCahn {
    dt: f64,
    dx: f64,
    mobility: f64,
    kappa: f64,
    barrier: f64,
}

impl AllenCahn {
    /// Kernel with gradient coefficient `kappa` and well height
    /// `barrier`; `dt = 0.01`, `dx = 1`, `mobility = 1`.
    pub fn new(kappa: f64, barrier: f64) -> Self {
        Self {
            dt: 0.01,
            dx: 1.0,
            mobility: 1.0,
            kappa,
            barrier,
        }
    }

    /// Time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Gradient-energy coefficient.
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Well height.
    pub fn barrier(&self) -> f64 {
        self.barrier
    }

    /// Derivative of the double-well potential.
    pub fn well_slope(&self, phi: f64) -> f64 {
        2.0 * self.barrier * phi * (1.0 - phi) * (1.0 - 2.0 * phi)
    }

    fn check_stability(&self, ndim: usize) -> Result<(), KernelError> {
        let gradient_limit = max_stable_dt(ndim, self.dx, self.mobility * self.kappa);
        if self.dt > gradient_limit {
            return Err(KernelError::Unstable {
                reason: format!(
                    "dt = {} exceeds the gradient-term limit {gradient_limit}",
                    self.dt
                ),
            });
        }
        // Curvature of the well is at most 2W, at the minima.
        let reaction_limit = 1.0 / (2.0 * self.mobility * self.barrier);
        if self.dt > reaction_limit {
            return Err(KernelError::Unstable {
                reason: format!(
                    "dt = {} exceeds the reaction-term limit {reaction_limit}",
                    self.dt
                ),
            });
        }
        Ok(())
    }
}

impl Default for AllenCahn {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Kernel for AllenCahn {
    fn name(&self) -> &str {
        "allen-cahn"
    }

    fn preprocess(
        &mut self,
        state: &mut KernelState<'_>,
        params: &Params,
    ) -> Result<(), KernelError> {
        self.dt = positive(params, "dt", self.dt)?;
        self.dx = positive(params, "dx", self.dx)?;
        self.mobility = positive(params, "mobility", self.mobility)?;
        self.kappa = positive(params, "kappa", self.kappa)?;
        self.barrier = positive(params, "barrier", self.barrier)?;

        let ghost = state.layout().ghost();
        if ghost < self.min_ghost_width() {
            return Err(KernelError::GhostTooNarrow {
                required: self.min_ghost_width(),
                found: ghost,
            });
        }
        self.check_stability(state.layout().ndim())?;

        state.mobility_mut().fill(self.mobility);
        state.chem_pot_mut().fill(0.0);
        Ok(())
    }

    fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        let layout = *state.layout();
        let (fields, chem_pot, mobility) = state.split_mut();
        for f in 0..fields.count() {
            let phi = fields.field(f);
            let mu = chem_pot.field_mut(f);
            laplacian(&layout, phi, self.dx, mu);
            layout.for_each_interior(|_, idx| {
                mu[idx] = self.well_slope(phi[idx]) - self.kappa * mu[idx];
            });
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

    fn postprocess(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        state.check_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::buffers;

    #[test]
    fn minima_and_maximum_are_fixed_points() {
        let kernel = AllenCahn::default();
        assert_eq!(kernel.well_slope(0.0), 0.0);
        assert_eq!(kernel.well_slope(0.5), 0.0);
        assert_eq!(kernel.well_slope(1.0), 0.0);
        assert!(kernel.well_slope(0.4) > 0.0);
        assert!(kernel.well_slope(0.6) < 0.0);
    }

    #[test]
    fn uniform_state_falls_into_nearest_well() {
        let mut b = buffers(&[4, 4], 1, &["high", "low"]);
        b.fields.field_mut(0).fill(0.6);
        b.fields.field_mut(1).fill(0.4);
        let mut kernel = AllenCahn::default();
        let params: Params = [("dt", "0.1")].into_iter().collect();
        kernel.preprocess(&mut b.state(0), &params).unwrap();

        // Ghosts match the interior for the first step only.
        kernel.apply(&mut b.state(1)).unwrap();
        let centre = b.layout.index([2, 2, 0]);
        assert!(b.fields.field(0)[centre] > 0.6);
        assert!(b.fields.field(1)[centre] < 0.4);
    }

    #[test]
    fn reaction_limit_is_enforced() {
        let mut b = buffers(&[8], 1, &["phi"]);
        let params: Params = [("dt", "0.1"), ("barrier", "10")].into_iter().collect();
        let err = AllenCahn::default()
            .preprocess(&mut b.state(0), &params)
            .unwrap_err();
        match err {
            KernelError::Unstable { reason } => assert!(reason.contains("reaction"), "{reason}"),
            other => panic!("expected Unstable, got {other}"),
        }
    }

    #[test]
    fn gradient_limit_is_enforced() {
        let mut b = buffers(&[8, 8, 8], 1, &["phi"]);
        let params: Params = [("dt", "0.1"), ("kappa", "2")].into_iter().collect();
        let err = AllenCahn::default()
            .preprocess(&mut b.state(0), &params)
            .unwrap_err();
        match err {
            KernelError::Unstable { reason } => assert!(reason.contains("gradient"), "{reason}"),
            other => panic!("expected Unstable, got {other}"),
        }
    }

    #[test]
    fn missing_keys_keep_constructor_values() {
        let mut b = buffers(&[8], 1, &["phi"]);
        let mut kernel = AllenCahn::new(0.5, 2.0);
        kernel.preprocess(&mut b.state(0), &Params::new()).unwrap();
        assert_eq!(kernel.kappa(), 0.5);
        assert_eq!(kernel.barrier(), 2.0);
        assert_eq!(kernel.dt(), 0.01);
    }
}
