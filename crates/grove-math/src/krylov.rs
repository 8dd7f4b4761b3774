//! Restarted GMRES.
//!
//! The operator is supplied as a closure `apply(x, y)` writing `y = A x`,
//! so the same routine serves assembled matrices and Jacobian-free
//! products. Givens rotations keep the least-squares residual available
//! at every inner iteration.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// GMRES parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmresConfig {
    /// Krylov subspace size before restart.
    pub restart: usize,
    /// Maximum total inner iterations.
    pub max_iterations: usize,
    /// Convergence when `‖b − A x‖ ≤ rel_tolerance · ‖b‖`.
    pub rel_tolerance: f64,
    /// Convergence when `‖b − A x‖ ≤ abs_tolerance`.
    pub abs_tolerance: f64,
}

impl Default for GmresConfig {
    fn default() -> Self {
        Self {
            restart: 50,
            max_iterations: 500,
            rel_tolerance: 1e-8,
            abs_tolerance: 1e-14,
        }
    }
}

/// Outcome of a Krylov solve.
#[derive(Debug, Clone, Copy)]
pub struct KrylovReport {
    /// Inner iterations (operator applications excluding restarts).
    pub iterations: usize,
    /// Final residual norm `‖b − A x‖`.
    pub residual: f64,
    /// Whether the tolerance was met.
    pub converged: bool,
}

/// Solves `A x = b` with restarted GMRES, starting from the given `x`.
pub fn gmres<F>(mut apply: F, b: &DVector<f64>, x: &mut DVector<f64>, config: &GmresConfig) -> KrylovReport
where
    F: FnMut(&DVector<f64>, &mut DVector<f64>),
{
    let n = b.len();
    let b_norm = b.norm();
    if n == 0 || b_norm == 0.0 {
        x.fill(0.0);
        return KrylovReport {
            iterations: 0,
            residual: 0.0,
            converged: true,
        };
    }

    let tol = (config.rel_tolerance * b_norm).max(config.abs_tolerance);
    let m = config.restart.clamp(1, n);
    let mut w = DVector::zeros(n);
    let mut total = 0usize;

    loop {
        apply(x, &mut w);
        let r = b - &w;
        let beta = r.norm();
        if beta <= tol {
            return KrylovReport {
                iterations: total,
                residual: beta,
                converged: true,
            };
        }
        if total >= config.max_iterations || !beta.is_finite() {
            return KrylovReport {
                iterations: total,
                residual: beta,
                converged: false,
            };
        }

        let mut basis: Vec<DVector<f64>> = Vec::with_capacity(m + 1);
        basis.push(r / beta);
        let mut h = DMatrix::<f64>::zeros(m + 1, m);
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut g = DVector::<f64>::zeros(m + 1);
        g[0] = beta;
        let mut used = 0;

        for k in 0..m {
            apply(&basis[k], &mut w);
            let mut q = w.clone();
            // Modified Gram-Schmidt
            for (j, vj) in basis.iter().enumerate() {
                let hjk = vj.dot(&q);
                h[(j, k)] = hjk;
                q.axpy(-hjk, vj, 1.0);
            }
            let h_next = q.norm();
            h[(k + 1, k)] = h_next;

            for j in 0..k {
                let upper = cs[j] * h[(j, k)] + sn[j] * h[(j + 1, k)];
                h[(j + 1, k)] = -sn[j] * h[(j, k)] + cs[j] * h[(j + 1, k)];
                h[(j, k)] = upper;
            }
            let denom = h[(k, k)].hypot(h[(k + 1, k)]);
            if denom == 0.0 {
                cs[k] = 1.0;
                sn[k] = 0.0;
            } else {
                cs[k] = h[(k, k)] / denom;
                sn[k] = h[(k + 1, k)] / denom;
            }
            h[(k, k)] = cs[k] * h[(k, k)] + sn[k] * h[(k + 1, k)];
            h[(k + 1, k)] = 0.0;
            g[k + 1] = -sn[k] * g[k];
            g[k] *= cs[k];

            used = k + 1;
            total += 1;

            if g[k + 1].abs() <= tol || h_next == 0.0 || total >= config.max_iterations {
                break;
            }
            basis.push(q / h_next);
        }

        // Back substitution on the rotated upper-triangular system
        let mut y = vec![0.0; used];
        for i in (0..used).rev() {
            let mut s = g[i];
            for j in (i + 1)..used {
                s -= h[(i, j)] * y[j];
            }
            y[i] = if h[(i, i)] != 0.0 { s / h[(i, i)] } else { 0.0 };
        }
        for (yj, vj) in y.iter().zip(basis.iter()) {
            x.axpy(*yj, vj, 1.0);
        }
    }
}
