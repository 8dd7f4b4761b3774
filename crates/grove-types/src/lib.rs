//! # grove-types
//!
//! Shared types, identifiers, error types, and numerical constants
//! for the Grove material point method engine.
//!
//! This crate has zero domain logic: it defines the vocabulary
//! that all other Grove crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{GroveError, GroveResult};
pub use ids::ParticleId;
pub use scalar::Real;
