//! Integration tests for grove-math.

use approx::assert_relative_eq;
use nalgebra::DVector;

use grove_math::faer_solver::FaerLuSolver;
use grove_math::krylov::{gmres, GmresConfig};
use grove_math::newton::{newton_solve, NewtonConfig};
use grove_math::sparse::{CsrMatrix, SparseSolver};
use grove_math::tensor::{self, Matrix, Vector};

// ─── Tensor Tests ─────────────────────────────────────────────

#[test]
fn det_and_inverse_2d() {
    let m = Matrix::<2>::new(4.0, 7.0, 2.0, 6.0);
    assert_relative_eq!(tensor::det(&m), 10.0, epsilon = 1e-12);
    let inv = tensor::inverse(&m).unwrap();
    assert_relative_eq!(m * inv, Matrix::<2>::identity(), epsilon = 1e-12);
}

#[test]
fn det_and_inverse_3d() {
    let m = Matrix::<3>::new(2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 1.0);
    assert_relative_eq!(tensor::det(&m), m.determinant(), epsilon = 1e-12);
    let inv = tensor::inverse(&m).unwrap();
    assert_relative_eq!(m * inv, Matrix::<3>::identity(), epsilon = 1e-12);
}

#[test]
fn singular_matrix_has_no_inverse() {
    let m = Matrix::<3>::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
    assert!(tensor::inverse(&m).is_none());
}

#[test]
fn outer_product_entries() {
    let a = Vector::<2>::new(1.0, 2.0);
    let b = Vector::<2>::new(3.0, 4.0);
    let o = tensor::outer(&a, &b);
    assert_eq!(o[(0, 1)], 4.0);
    assert_eq!(o[(1, 0)], 6.0);
}

#[test]
fn double_contraction_with_identity_tangent() {
    // c_ijkl = δ_ik δ_jl maps H to itself
    let mut c = tensor::zero_tangent::<3>();
    for (i, row) in c.iter_mut().enumerate() {
        for (j, block) in row.iter_mut().enumerate() {
            block[(i, j)] = 1.0;
        }
    }
    let h = Matrix::<3>::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
    assert_eq!(tensor::double_contract(&c, &h), h);
}

#[test]
fn von_mises_uniaxial_equals_axial_stress() {
    let mut s3 = Matrix::<3>::zeros();
    s3[(0, 0)] = 5.0;
    assert_relative_eq!(tensor::von_mises(&s3), 5.0, epsilon = 1e-12);

    let mut s2 = Matrix::<2>::zeros();
    s2[(1, 1)] = -3.0;
    assert_relative_eq!(tensor::von_mises(&s2), 3.0, epsilon = 1e-12);
}

#[test]
fn von_mises_hydrostatic_is_zero() {
    let s = Matrix::<3>::identity() * 7.0;
    assert_relative_eq!(tensor::von_mises(&s), 0.0, epsilon = 1e-12);
}

#[test]
fn von_mises_plane_strain_includes_normal_stress() {
    let (a, b, c) = (4.0, -1.0, 2.0);
    let s2 = Matrix::<2>::new(a, 0.0, 0.0, b);
    let expected = (0.5 * ((a - b).powi(2) + (b - c).powi(2) + (c - a).powi(2))).sqrt();
    assert_relative_eq!(tensor::von_mises_plane_strain(&s2, c), expected, epsilon = 1e-12);

    let hydrostatic = Matrix::<2>::identity() * 3.0;
    assert_relative_eq!(tensor::von_mises_plane_strain(&hydrostatic, 3.0), 0.0, epsilon = 1e-12);
    assert!(tensor::von_mises(&hydrostatic) > 0.0);

    let s3 = Matrix::<3>::from_diagonal(&Vector::<3>::new(a, b, c));
    assert_relative_eq!(tensor::von_mises_plane_strain(&s3, 100.0), expected, epsilon = 1e-12);
}

// ─── Sparse Matrix Tests ──────────────────────────────────────

#[test]
fn csr_from_triplets_sums_duplicates() {
    let triplets = vec![(0, 0, 1.0), (1, 1, 2.0), (0, 0, 3.0), (1, 0, -1.0), (1, 1, 0.5)];
    let m = CsrMatrix::from_triplets(2, 2, &triplets);
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.get(0, 0), 4.0);
    assert_eq!(m.get(0, 1), 0.0);
    assert_eq!(m.get(1, 0), -1.0);
    assert_eq!(m.get(1, 1), 2.5);
}

#[test]
fn csr_mul_vec() {
    let triplets = vec![(0, 0, 2.0), (0, 2, 1.0), (1, 1, 3.0), (2, 0, 1.0), (2, 2, 4.0)];
    let m = CsrMatrix::from_triplets(3, 3, &triplets);
    let x = [1.0, 2.0, 3.0];
    let mut y = [0.0; 3];
    m.mul_vec(&x, &mut y);
    assert_eq!(y, [5.0, 6.0, 13.0]);
}

#[test]
fn empty_matrix() {
    let m = CsrMatrix::new(10, 10);
    assert_eq!(m.nnz(), 0);
}

// ─── Sparse LU Tests ──────────────────────────────────────────

fn nonsymmetric_system() -> CsrMatrix {
    CsrMatrix::from_triplets(
        3,
        3,
        &[
            (0, 0, 4.0),
            (0, 1, 1.0),
            (1, 0, 2.0),
            (1, 1, 5.0),
            (1, 2, 1.0),
            (2, 1, -1.0),
            (2, 2, 3.0),
        ],
    )
}

#[test]
fn lu_solves_nonsymmetric_system() {
    let a = nonsymmetric_system();
    let mut solver = FaerLuSolver::new();
    assert!(!solver.is_factorized());
    solver.factorize(&a).unwrap();
    assert!(solver.is_factorized());

    let expected = [1.0, -2.0, 0.5];
    let mut b = [0.0; 3];
    a.mul_vec(&expected, &mut b);

    let mut x = [0.0; 3];
    solver.solve(&b, &mut x).unwrap();
    for (xi, ei) in x.iter().zip(expected.iter()) {
        assert_relative_eq!(*xi, *ei, epsilon = 1e-10);
    }
}

#[test]
fn lu_rejects_non_square() {
    let a = CsrMatrix::from_triplets(2, 3, &[(0, 0, 1.0), (1, 1, 1.0)]);
    let mut solver = FaerLuSolver::new();
    assert!(solver.factorize(&a).is_err());
}

#[test]
fn lu_solve_before_factorize_fails() {
    let solver = FaerLuSolver::new();
    let mut x = [0.0; 2];
    assert!(solver.solve(&[1.0, 1.0], &mut x).is_err());
}

// ─── GMRES Tests ──────────────────────────────────────────────

#[test]
fn gmres_matches_direct_solve() {
    let a = nonsymmetric_system();
    let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
    let mut x = DVector::zeros(3);
    let report = gmres(
        |v, out| a.mul_vec(v.as_slice(), out.as_mut_slice()),
        &b,
        &mut x,
        &GmresConfig::default(),
    );
    assert!(report.converged);
    assert!(report.iterations <= 3);

    let mut ax = [0.0; 3];
    a.mul_vec(x.as_slice(), &mut ax);
    for (axi, bi) in ax.iter().zip(b.iter()) {
        assert_relative_eq!(*axi, *bi, epsilon = 1e-7);
    }
}

#[test]
fn gmres_converges_with_small_restart() {
    // Diagonally dominant tridiagonal operator, applied matrix-free
    let n = 20;
    let apply = |v: &DVector<f64>, out: &mut DVector<f64>| {
        for i in 0..n {
            let mut s = 4.0 * v[i];
            if i > 0 {
                s -= v[i - 1];
            }
            if i + 1 < n {
                s -= 2.0 * v[i + 1];
            }
            out[i] = s;
        }
    };
    let b = DVector::from_element(n, 1.0);
    let mut x = DVector::zeros(n);
    let config = GmresConfig {
        restart: 5,
        max_iterations: 400,
        ..GmresConfig::default()
    };
    let report = gmres(apply, &b, &mut x, &config);
    assert!(report.converged, "residual {}", report.residual);
    assert!(report.residual <= 1e-8 * b.norm() + 1e-14);
}

#[test]
fn gmres_zero_rhs_returns_zero() {
    let b = DVector::zeros(4);
    let mut x = DVector::from_element(4, 3.0);
    let report = gmres(|v, out| out.copy_from(v), &b, &mut x, &GmresConfig::default());
    assert!(report.converged);
    assert_eq!(x, DVector::zeros(4));
}

// ─── Newton Tests ─────────────────────────────────────────────

#[test]
fn newton_linear_problem_converges_in_one_iteration() {
    // R(u) = A u − b with an exact linear correction
    let a = nonsymmetric_system();
    let b = DVector::from_vec(vec![1.0, 0.0, -1.0]);
    let mut solver = FaerLuSolver::new();
    solver.factorize(&a).unwrap();

    let mut u = DVector::zeros(3);
    let report = newton_solve(
        &mut u,
        &mut solver,
        |u, _| {
            let mut au = DVector::zeros(3);
            a.mul_vec(u.as_slice(), au.as_mut_slice());
            Ok(au - &b)
        },
        |_, r, solver| {
            let rhs: Vec<f64> = r.iter().map(|v| -v).collect();
            let mut du = DVector::zeros(3);
            solver.solve(&rhs, du.as_mut_slice())?;
            Ok(du)
        },
        &NewtonConfig::default(),
    )
    .unwrap();

    assert!(report.converged);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.history.len(), 2);
}

#[test]
fn newton_square_root_of_two() {
    let mut u = DVector::from_element(1, 1.0);
    let mut evaluations = 0u32;
    let report = newton_solve(
        &mut u,
        &mut evaluations,
        |u, count| {
            *count += 1;
            Ok(DVector::from_element(1, u[0] * u[0] - 2.0))
        },
        |u, r, _| Ok(DVector::from_element(1, -r[0] / (2.0 * u[0]))),
        &NewtonConfig::default(),
    )
    .unwrap();

    assert!(report.converged);
    assert_relative_eq!(u[0], 2f64.sqrt(), epsilon = 1e-10);
    assert_eq!(evaluations, report.iterations + 1);
    assert!(report.residual < report.initial_residual);
}

#[test]
fn newton_reports_nonconvergence_at_limit() {
    let mut u = DVector::from_element(1, 1.0);
    let config = NewtonConfig {
        max_iterations: 2,
        abs_tolerance: 0.0,
        rel_tolerance: 0.0,
    };
    let report = newton_solve(
        &mut u,
        &mut (),
        |u, _| Ok(DVector::from_element(1, u[0] * u[0] - 2.0)),
        |u, r, _| Ok(DVector::from_element(1, -r[0] / (2.0 * u[0]))),
        &config,
    )
    .unwrap();

    assert!(!report.converged);
    assert_eq!(report.iterations, 2);
}
