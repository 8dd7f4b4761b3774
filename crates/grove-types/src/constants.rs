//! Physical constants and numerical defaults.

/// Standard gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Default Courant number for CFL-limited explicit stepping.
pub const DEFAULT_COURANT: f64 = 0.8;

/// Default maximum Newton iterations per implicit step.
pub const DEFAULT_NEWTON_ITERATIONS: u32 = 20;

/// Default Newmark-beta parameters (average acceleration, unconditionally stable).
pub const NEWMARK_BETA: f64 = 0.25;
pub const NEWMARK_GAMMA: f64 = 0.5;

/// Kernel weights below this magnitude are treated as outside the support.
pub const WEIGHT_EPSILON: f64 = 1.0e-14;

/// Relative threshold under which a kernel-correction moment matrix is
/// considered singular.
pub const MOMENT_SINGULARITY_THRESHOLD: f64 = 1.0e-10;
