//! Finite-difference helpers over ghost-padded buffers.

use strand_decomp::LocalLayout;

/// Second-order central Laplacian of `src` at every interior cell,
/// written to the same index of `out`.
///
/// Reads one ghost layer on each side of every active axis. Ghost
/// cells of `out` are left untouched.
pub fn laplacian(layout: &LocalLayout, src: &[f64], dx: f64, out: &mut [f64]) {
    let strides = layout.strides();
    let ndim = layout.ndim();
    let inv_dx2 = 1.0 / (dx * dx);
    layout.for_each_interior(|_, idx| {
        let centre = src[idx];
        let mut sum = 0.0;
        for &s in &strides[..ndim] {
            sum += src[idx + s] + src[idx - s] - 2.0 * centre;
        }
        out[idx] = sum * inv_dx2;
    });
}

/// Relaxation update `phi -= dt * mobility * mu` over the interior.
pub fn relax(layout: &LocalLayout, phi: &mut [f64], mu: &[f64], mobility: &[f64], dt: f64) {
    layout.for_each_interior(|_, idx| {
        phi[idx] -= dt * mobility[idx] * mu[idx];
    });
}

/// Largest stable explicit step for a Laplacian term with coefficient
/// `coeff` on an `ndim`-axis grid of spacing `dx`.
pub fn max_stable_dt(ndim: usize, dx: f64, coeff: f64) -> f64 {
    dx * dx / (2.0 * ndim as f64 * coeff)
}
