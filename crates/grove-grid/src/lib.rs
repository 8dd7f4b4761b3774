//! # grove-grid
//!
//! Structured background grid with Structure-of-Arrays (SoA) nodal
//! fields, plus the degree-of-freedom map used by the implicit solver.
//!
//! ## Key Types
//!
//! - [`Grid`]: regular lattice over an axis-aligned box. Node indices
//!   are column-major (axis 0 varies fastest).
//! - [`NodeRange`]: box of node indices inside a kernel's support.
//! - [`DofMap`]: bijection between active nodal components and a
//!   reduced unknown vector.

pub mod dofmap;
pub mod lattice;
pub mod range;

pub use dofmap::DofMap;
pub use lattice::{Grid, Side};
pub use range::NodeRange;
