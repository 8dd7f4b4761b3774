//! # grove-solver
//!
//! Particle state, particle–grid transfers and time integration.
//!
//! ## Key Types
//!
//! - [`ParticleSet`]: SoA buffers for per-particle state
//! - [`TransferScheme`]: FLIP(α) / APIC / TPIC velocity transfer
//! - [`SolverStrategy`]: pluggable integrator trait
//! - [`ExplicitSolver`]: updated-Lagrangian explicit MPM
//! - [`TotalLagrangianSolver`]: reference-configuration explicit MPM
//! - [`ImplicitSolver`]: Newmark-β with Newton, assembled or Jacobian-free
//! - [`Simulation`]: owns grid, particles and solver; keeps the clock

pub mod config;
pub mod explicit;
pub mod implicit;
pub mod particles;
pub mod scheme;
pub mod simulation;
pub mod strategy;
pub mod timestep;
pub mod total_lagrangian;
pub mod transfer;
pub mod update;

pub use config::{
    ExplicitConfig, ImplicitConfig, InversionPolicy, LinearSolverKind, NonConvergencePolicy,
    TotalLagrangianConfig,
};
pub use explicit::ExplicitSolver;
pub use implicit::ImplicitSolver;
pub use particles::{ParticleSet, StressMeasure};
pub use scheme::TransferScheme;
pub use simulation::Simulation;
pub use strategy::{SolverStrategy, StepReport};
pub use timestep::TimeStepping;
pub use total_lagrangian::{GridBodyForce, TotalLagrangianSolver};
