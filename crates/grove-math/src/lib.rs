//! # grove-math
//!
//! Linear algebra primitives for the Grove MPM engine.
//!
//! Provides:
//! - Dimension-generic vector / tensor aliases over `nalgebra` static types
//!   plus the handful of tensor operations continuum mechanics needs
//! - Sparse matrix representation (CSR) and a sparse LU solver via `faer`
//! - Restarted GMRES for matrix-free (Jacobian-free) linear solves
//! - A Newton driver whose state is passed explicitly by reference

pub mod faer_solver;
pub mod krylov;
pub mod newton;
pub mod sparse;
pub mod tensor;

pub use nalgebra::DVector;
pub use tensor::{Matrix, Tangent, Vector};
