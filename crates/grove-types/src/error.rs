//! Error types for the Grove engine.
//!
//! All crates return `GroveResult<T>` from fallible operations.

use thiserror::Error;

use crate::ids::ParticleId;

/// Unified error type for the Grove engine.
#[derive(Debug, Error)]
pub enum GroveError {
    /// The kernel-correction moment matrix of a particle is singular.
    /// Aborts the current step.
    #[error("Degenerate kernel support for particle {particle}: moment matrix is singular")]
    DegenerateSupport { particle: ParticleId },

    /// A particle has no grid node inside its kernel support: it left the
    /// grid or the grid is too coarse. Aborts the current step.
    #[error("Empty kernel support for particle {particle}")]
    EmptySupport { particle: ParticleId },

    /// Newton iteration exhausted its budget without meeting tolerance.
    #[error("Newton did not converge after {iterations} iterations (residual: {residual:.2e})")]
    NonConvergence { iterations: u32, residual: f64 },

    /// A particle's deformation gradient has a non-positive determinant.
    #[error("Inverted deformation at particle {particle} (J = {jacobian:.3e})")]
    InvertedDeformation { particle: ParticleId, jacobian: f64 },

    /// Grid construction or access is inconsistent.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Material parameter is out of valid range.
    #[error("Invalid material parameter: {0}")]
    InvalidMaterial(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sparse factorization or Krylov solve failed.
    #[error("Linear solve failed: {0}")]
    LinearSolve(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GroveError {
    /// Returns true for errors raised by the kernel evaluator or the
    /// transfer operators (the ones that abort a step).
    pub fn is_support_error(&self) -> bool {
        matches!(
            self,
            GroveError::DegenerateSupport { .. } | GroveError::EmptySupport { .. }
        )
    }
}

/// Convenience alias for `Result<T, GroveError>`.
pub type GroveResult<T> = Result<T, GroveError>;
