//! # grove-material
//!
//! Constitutive model abstraction and material database.
//!
//! ## Design
//!
//! The [`ConstitutiveModel`] trait maps a deformation gradient to stress
//! and, for the implicit solver, to the consistent tangent of the
//! Kirchhoff stress with respect to a displacement-gradient increment.
//! Models are swapped at runtime via the strategy pattern.
//!
//! The [`MaterialDatabase`] stores named elastic presets used by the
//! benchmark scenarios.

pub mod database;
pub mod linear;
pub mod neo_hookean;
pub mod properties;
pub mod traits;

pub use database::MaterialDatabase;
pub use linear::LinearElastic;
pub use neo_hookean::NeoHookean;
pub use properties::{ElasticProperties, MaterialModel};
pub use traits::ConstitutiveModel;
