//! One-dimensional B-spline kernels.
//!
//! `q` is the particle–node offset in units of grid spacing,
//! `q = (x_p − x_i) / h`. Multi-dimensional weights are products of
//! per-axis values.

/// A separable 1-D interpolation kernel.
pub trait Kernel: Send + Sync {
    /// Support half-width in cells. Nodes with `|q| ≥ radius` get no weight.
    fn support_radius(&self) -> f64;

    /// `N(q)`.
    fn value(&self, q: f64) -> f64;

    /// `dN/dq`.
    fn derivative(&self, q: f64) -> f64;

    /// Factor `k` of the APIC inertia tensor `D = k h² I`, when the
    /// kernel admits one.
    fn affine_inertia_factor(&self) -> Option<f64> {
        None
    }
}

/// Tent function, support of one cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBSpline;

impl Kernel for LinearBSpline {
    fn support_radius(&self) -> f64 {
        1.0
    }

    #[inline]
    fn value(&self, q: f64) -> f64 {
        let r = q.abs();
        if r < 1.0 {
            1.0 - r
        } else {
            0.0
        }
    }

    #[inline]
    fn derivative(&self, q: f64) -> f64 {
        if q == 0.0 || q.abs() >= 1.0 {
            0.0
        } else {
            -q.signum()
        }
    }
}

/// Quadratic B-spline, support of 1.5 cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticBSpline;

impl Kernel for QuadraticBSpline {
    fn support_radius(&self) -> f64 {
        1.5
    }

    #[inline]
    fn value(&self, q: f64) -> f64 {
        let r = q.abs();
        if r < 0.5 {
            0.75 - r * r
        } else if r < 1.5 {
            0.5 * (1.5 - r) * (1.5 - r)
        } else {
            0.0
        }
    }

    #[inline]
    fn derivative(&self, q: f64) -> f64 {
        let r = q.abs();
        if r < 0.5 {
            -2.0 * q
        } else if r < 1.5 {
            -(1.5 - r) * q.signum()
        } else {
            0.0
        }
    }

    fn affine_inertia_factor(&self) -> Option<f64> {
        Some(0.25)
    }
}
