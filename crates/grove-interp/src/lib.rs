//! # grove-interp
//!
//! Particle–grid interpolation for the Grove MPM engine.
//!
//! ## Key Types
//!
//! - [`Kernel`]: 1-D separable shape function (value, derivative, support).
//! - [`Interpolation`]: evaluates weights `N` and gradients `∇N` of one
//!   particle against every node in its support.
//! - [`KernelCorrection`]: wraps any [`Interpolation`] and restores the
//!   linear reproducing conditions where the support is cut by the grid
//!   boundary.
//! - [`MpValues`]: the per-particle weight store, refreshed in parallel.

pub mod correction;
pub mod interpolation;
pub mod kernel;
pub mod mpvalue;

pub use correction::KernelCorrection;
pub use interpolation::{Interpolation, InterpolationKind};
pub use kernel::{Kernel, LinearBSpline, QuadraticBSpline};
pub use mpvalue::{MpValue, MpValues, Weight};
