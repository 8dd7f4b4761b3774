//! Solver configuration.
//!
//! Parameters that control each integrator: timestep selection, body
//! forces, Newton and linear-solver settings, and the recovery policies
//! for non-convergence and inverted elements.

use serde::{Deserialize, Serialize};

use grove_math::krylov::GmresConfig;
use grove_math::newton::NewtonConfig;
use grove_math::Vector;
use grove_types::constants::{DEFAULT_COURANT, NEWMARK_BETA, NEWMARK_GAMMA};
use grove_types::{GroveError, GroveResult, ParticleId};

use crate::scheme::TransferScheme;
use crate::timestep::TimeStepping;

/// What to do when a particle's `J = det F` is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionPolicy {
    /// Abort the step with `InvertedDeformation`.
    #[default]
    Fail,
    /// Continue with the inverted state.
    Ignore,
}

impl InversionPolicy {
    /// Applies the policy to particle `p` with Jacobian `j`.
    pub fn check(self, p: usize, j: f64) -> GroveResult<()> {
        match self {
            Self::Fail if j <= 0.0 || !j.is_finite() => Err(GroveError::InvertedDeformation {
                particle: ParticleId::from(p),
                jacobian: j,
            }),
            _ => Ok(()),
        }
    }
}

/// What the implicit solver does when Newton runs out of iterations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NonConvergencePolicy {
    /// Fail the step with `NonConvergence`.
    Abort,
    /// Apply the last Newton iterate and carry on.
    #[default]
    AcceptLastIterate,
    /// Retry the step with `dt · factor`, at most `max_retries` times.
    ShrinkTimestep { factor: f64, max_retries: u32 },
}

/// How the Newton correction is computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinearSolverKind {
    /// Assemble the sparse tangent and factorize it with sparse LU.
    #[default]
    Assembled,
    /// Matrix-free Jacobian products solved with restarted GMRES.
    JacobianFree {
        #[serde(default)]
        gmres: GmresConfig,
    },
}

/// Converts a configured gravity vector; empty means zero.
pub fn gravity_vector<const D: usize>(gravity: &[f64]) -> GroveResult<Vector<D>> {
    match gravity.len() {
        0 => Ok(Vector::<D>::zeros()),
        n if n == D => Ok(Vector::<D>::from_column_slice(gravity)),
        n => Err(GroveError::InvalidConfig(format!(
            "Gravity has {n} components, expected {D}"
        ))),
    }
}

/// Configuration for the explicit updated-Lagrangian solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplicitConfig {
    /// Velocity transfer scheme.
    pub transfer: TransferScheme,
    /// Fixed or CFL-limited timestep.
    pub timestep: TimeStepping,
    /// Uniform gravitational acceleration (empty = none).
    #[serde(default)]
    pub gravity: Vec<f64>,
    #[serde(default)]
    pub inversion: InversionPolicy,
}

impl Default for ExplicitConfig {
    fn default() -> Self {
        Self {
            transfer: TransferScheme::default(),
            timestep: TimeStepping::Cfl {
                courant: DEFAULT_COURANT,
            },
            gravity: Vec::new(),
            inversion: InversionPolicy::default(),
        }
    }
}

impl ExplicitConfig {
    /// `inertia_factor` comes from the chosen kernel; APIC needs one.
    pub fn validate(&self, inertia_factor: Option<f64>) -> GroveResult<()> {
        self.timestep.validate()?;
        self.transfer.validate(inertia_factor)
    }
}

/// Configuration for the Newmark-β implicit solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplicitConfig {
    /// Timestep.
    pub dt: f64,
    /// Newmark β.
    pub beta: f64,
    /// Newmark γ.
    pub gamma: f64,
    #[serde(default)]
    pub gravity: Vec<f64>,
    #[serde(default)]
    pub newton: NewtonConfig,
    #[serde(default)]
    pub linear_solver: LinearSolverKind,
    #[serde(default)]
    pub on_nonconvergence: NonConvergencePolicy,
    #[serde(default)]
    pub inversion: InversionPolicy,
}

impl Default for ImplicitConfig {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            beta: NEWMARK_BETA,
            gamma: NEWMARK_GAMMA,
            gravity: Vec::new(),
            newton: NewtonConfig::default(),
            linear_solver: LinearSolverKind::default(),
            on_nonconvergence: NonConvergencePolicy::default(),
            inversion: InversionPolicy::default(),
        }
    }
}

impl ImplicitConfig {
    pub fn validate(&self) -> GroveResult<()> {
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(GroveError::InvalidConfig(format!(
                "Timestep must be positive, got {}",
                self.dt
            )));
        }
        if self.beta <= 0.0 || self.gamma <= 0.0 {
            return Err(GroveError::InvalidConfig(format!(
                "Newmark parameters must be positive, got beta={} gamma={}",
                self.beta, self.gamma
            )));
        }
        if self.newton.abs_tolerance < 0.0 || self.newton.rel_tolerance < 0.0 {
            return Err(GroveError::InvalidConfig(
                "Newton tolerances must be non-negative".into(),
            ));
        }
        if let LinearSolverKind::JacobianFree { gmres } = &self.linear_solver {
            if gmres.restart == 0 || gmres.max_iterations == 0 {
                return Err(GroveError::InvalidConfig(
                    "GMRES restart and iteration limit must be at least 1".into(),
                ));
            }
        }
        if let NonConvergencePolicy::ShrinkTimestep { factor, .. } = self.on_nonconvergence {
            if factor <= 0.0 || factor >= 1.0 {
                return Err(GroveError::InvalidConfig(format!(
                    "Timestep shrink factor must lie in (0, 1), got {factor}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the total-Lagrangian solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalLagrangianConfig {
    /// FLIP blend factor.
    pub alpha: f64,
    /// Courant number for the CFL timestep.
    pub courant: f64,
    #[serde(default)]
    pub gravity: Vec<f64>,
    #[serde(default)]
    pub inversion: InversionPolicy,
}

impl Default for TotalLagrangianConfig {
    fn default() -> Self {
        Self {
            alpha: 0.99,
            courant: 0.1,
            gravity: Vec::new(),
            inversion: InversionPolicy::default(),
        }
    }
}

impl TotalLagrangianConfig {
    pub fn validate(&self) -> GroveResult<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(GroveError::InvalidConfig(format!(
                "FLIP blend factor must lie in [0, 1], got {}",
                self.alpha
            )));
        }
        TimeStepping::Cfl {
            courant: self.courant,
        }
        .validate()
    }
}
