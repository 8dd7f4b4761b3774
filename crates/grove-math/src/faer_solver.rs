//! Sparse LU solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait using faer's sparse LU
//! factorization. The implicit MPM tangent is square but not guaranteed
//! to be symmetric positive definite, so LU is used instead of Cholesky.
//!
//! ## Workflow
//! 1. `factorize(matrix)`: converts CSR→CSC, computes symbolic + numeric LU
//! 2. `solve(rhs, solution)`: forward/backward substitution (cached factorization)

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Lu, SymbolicLu};
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;

use grove_types::{GroveError, GroveResult};

use crate::sparse::{CsrMatrix, SparseSolver};

/// Sparse LU solver using `faer`.
///
/// The Newton tangent changes every iteration, so the factorization is
/// rebuilt on each `factorize` call.
pub struct FaerLuSolver {
    /// Cached LU factorization.
    factorization: Option<Lu<usize, f64>>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl FaerLuSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }

    /// Convert our CSR matrix to faer's CSC matrix.
    fn csr_to_csc(matrix: &CsrMatrix) -> GroveResult<SparseColMat<usize, f64>> {
        let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(matrix.nnz());
        for row in 0..matrix.rows {
            for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
                let col = matrix.col_idx[idx];
                let val = matrix.values[idx];
                triplets.push(Triplet { row, col, val });
            }
        }

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets).map_err(|e| {
            GroveError::LinearSolve(format!("Failed to construct faer CSC matrix: {e:?}"))
        })
    }
}

impl Default for FaerLuSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerLuSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> GroveResult<()> {
        if matrix.rows != matrix.cols {
            return Err(GroveError::LinearSolve(format!(
                "Matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        if matrix.rows == 0 {
            return Err(GroveError::LinearSolve("Cannot factorize empty matrix".into()));
        }

        self.dimension = matrix.rows;
        self.factorization = None;

        let csc = Self::csr_to_csc(matrix)?;

        // Step 1: Symbolic analysis (ordering, fill-in prediction)
        let symbolic = SymbolicLu::try_new(csc.symbolic().as_ref())
            .map_err(|e| GroveError::LinearSolve(format!("Symbolic analysis failed: {e:?}")))?;

        // Step 2: Numeric factorization
        let lu = Lu::try_new_with_symbolic(symbolic, csc.as_ref())
            .map_err(|e| GroveError::LinearSolve(format!("LU factorization failed: {e:?}")))?;

        self.factorization = Some(lu);
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> GroveResult<()> {
        let lu = self.factorization.as_ref().ok_or_else(|| {
            GroveError::LinearSolve("Solver not factorized. Call factorize() first.".into())
        })?;

        if rhs.len() != self.dimension {
            return Err(GroveError::LinearSolve(format!(
                "RHS length ({}) != matrix dimension ({})",
                rhs.len(),
                self.dimension
            )));
        }
        if solution.len() != self.dimension {
            return Err(GroveError::LinearSolve(format!(
                "Solution length ({}) != matrix dimension ({})",
                solution.len(),
                self.dimension
            )));
        }

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let sol = lu.solve(&rhs_mat);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = sol[(i, 0)];
        }
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(GroveError::LinearSolve(
                "LU solve produced non-finite values (singular matrix?)".into(),
            ));
        }

        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}
