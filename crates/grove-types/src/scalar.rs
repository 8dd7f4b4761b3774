//! Scalar type alias for the simulation.
//!
//! MPM accumulates many small contributions per node and the implicit
//! solver differentiates stresses, so everything runs in double precision.

/// The floating-point type used throughout the simulation.
pub type Real = f64;
