//! Dimension-generic tensors.
//!
//! Every spatial quantity is parameterized by a const dimension `D`
//! (2 or 3 in practice). Vectors and second-order tensors are
//! `nalgebra` static types; the fourth-order consistent tangent is a
//! `D × D` array of `D × D` matrices with
//! `c[i][j][(k, l)] = ∂τ_ij / ∂H_kl`.

use nalgebra::{DMatrix, SMatrix, SVector};

/// Spatial vector.
pub type Vector<const D: usize> = SVector<f64, D>;

/// Second-order tensor.
pub type Matrix<const D: usize> = SMatrix<f64, D, D>;

/// Fourth-order tensor, indexed `c[i][j][(k, l)]`.
pub type Tangent<const D: usize> = [[Matrix<D>; D]; D];

/// Returns the all-zero fourth-order tensor.
pub fn zero_tangent<const D: usize>() -> Tangent<D> {
    [[Matrix::<D>::zeros(); D]; D]
}

fn to_dynamic<const D: usize>(m: &Matrix<D>) -> DMatrix<f64> {
    DMatrix::from_fn(D, D, |i, j| m[(i, j)])
}

/// Determinant. Closed form for D ≤ 3, LU otherwise.
pub fn det<const D: usize>(m: &Matrix<D>) -> f64 {
    match D {
        1 => m[(0, 0)],
        2 => m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        3 => {
            m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
                - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
                + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
        }
        _ => to_dynamic(m).determinant(),
    }
}

/// Inverse, or `None` when the matrix is singular.
pub fn inverse<const D: usize>(m: &Matrix<D>) -> Option<Matrix<D>> {
    let d = det(m);
    if d == 0.0 || !d.is_finite() {
        return None;
    }
    match D {
        1 => Some(Matrix::<D>::from_element(1.0 / d)),
        2 => {
            let mut inv = Matrix::<D>::zeros();
            inv[(0, 0)] = m[(1, 1)] / d;
            inv[(0, 1)] = -m[(0, 1)] / d;
            inv[(1, 0)] = -m[(1, 0)] / d;
            inv[(1, 1)] = m[(0, 0)] / d;
            Some(inv)
        }
        3 => {
            // Cyclic cofactors carry their own sign.
            let mut inv = Matrix::<D>::zeros();
            for i in 0..3 {
                let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
                for j in 0..3 {
                    let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                    inv[(j, i)] = (m[(i1, j1)] * m[(i2, j2)] - m[(i1, j2)] * m[(i2, j1)]) / d;
                }
            }
            Some(inv)
        }
        _ => to_dynamic(m)
            .try_inverse()
            .map(|inv| Matrix::<D>::from_fn(|i, j| inv[(i, j)])),
    }
}

/// Symmetric part `(A + Aᵀ) / 2`.
#[inline]
pub fn symmetric<const D: usize>(m: &Matrix<D>) -> Matrix<D> {
    (m + m.transpose()) * 0.5
}

/// Outer product `a ⊗ b`.
#[inline]
pub fn outer<const D: usize>(a: &Vector<D>, b: &Vector<D>) -> Matrix<D> {
    a * b.transpose()
}

/// Double contraction `c : h`, i.e. `(c:h)_ij = Σ_kl c_ijkl h_kl`.
pub fn double_contract<const D: usize>(c: &Tangent<D>, h: &Matrix<D>) -> Matrix<D> {
    Matrix::<D>::from_fn(|i, j| c[i][j].component_mul(h).sum())
}

/// Von Mises equivalent stress.
///
/// 2-D tensors are embedded in 3-D with zero out-of-plane components
/// (plane stress).
pub fn von_mises<const D: usize>(sigma: &Matrix<D>) -> f64 {
    von_mises_plane_strain(sigma, 0.0)
}

/// Von Mises equivalent stress of a 2-D tensor embedded in 3-D with
/// normal stress `sigma_zz` out of the plane. Shear out of the plane is
/// zero. For 3-D tensors `sigma_zz` is ignored.
pub fn von_mises_plane_strain<const D: usize>(sigma: &Matrix<D>, sigma_zz: f64) -> f64 {
    let missing = 3 - D.min(3);
    let mean = (sigma.trace() + missing as f64 * sigma_zz) / 3.0;
    let mut s_ddot_s = 0.0;
    for i in 0..D {
        for j in 0..D {
            let s = if i == j { sigma[(i, j)] - mean } else { sigma[(i, j)] };
            s_ddot_s += s * s;
        }
    }
    s_ddot_s += missing as f64 * (sigma_zz - mean).powi(2);
    (1.5 * s_ddot_s).sqrt()
}
