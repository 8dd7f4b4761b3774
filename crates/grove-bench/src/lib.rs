//! # grove-bench
//!
//! Reference scenarios for the MPM solvers, a runner that drives them
//! to completion, and CSV metrics for regression tracking.
//!
//! Scenarios:
//! 1. **Elastic impact**: two rings collide head-on (2-D, explicit)
//! 2. **Cantilever beam**: clamped beam sags under gravity (3-D, implicit)
//! 3. **Vortex**: annulus driven by a manufactured body force (2-D, total Lagrangian)
//! 4. **Colliding disks**: two elastic disks bounce off each other (2-D, explicit)

pub mod metrics;
pub mod runner;
pub mod sampling;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{Scenario, ScenarioConfig, ScenarioKind, ScenarioSetup};
