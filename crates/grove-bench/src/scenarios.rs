//! Benchmark scenarios: grid, particles and solver for each test case.
//!
//! Every scenario has a `resolution` multiplier that divides its grid
//! spacing, so tests can run coarse versions of the same setup.

use std::f64::consts::PI;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use grove_grid::{Grid, Side};
use grove_interp::InterpolationKind;
use grove_material::{database, ElasticProperties, MaterialModel};
use grove_math::Vector;
use grove_solver::config::{ExplicitConfig, ImplicitConfig, LinearSolverKind, TotalLagrangianConfig};
use grove_solver::{
    ExplicitSolver, GridBodyForce, ImplicitSolver, ParticleSet, SolverStrategy, TimeStepping,
    TotalLagrangianSolver, TransferScheme,
};
use grove_types::{GroveError, GroveResult};

use crate::sampling::{grid_sample, DEFAULT_PER_CELL};

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Two rings colliding head-on (2-D, explicit, quadratic B-spline).
    ElasticImpact {
        #[serde(default)]
        transfer: TransferScheme,
    },
    /// Beam clamped at `x = 0` sagging under gravity (3-D, Newmark-β).
    CantileverBeam {
        #[serde(default)]
        linear_solver: LinearSolverKind,
    },
    /// Generalized vortex in an annulus (2-D, total Lagrangian).
    Vortex,
    /// Two elastic disks bouncing off each other (2-D, explicit FLIP).
    CollidingDisks,
}

impl ScenarioKind {
    /// One instance of every scenario with default options.
    pub fn all() -> Vec<ScenarioKind> {
        vec![
            ScenarioKind::ElasticImpact {
                transfer: TransferScheme::default(),
            },
            ScenarioKind::CantileverBeam {
                linear_solver: LinearSolverKind::default(),
            },
            ScenarioKind::Vortex,
            ScenarioKind::CollidingDisks,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::ElasticImpact { .. } => "elastic_impact",
            ScenarioKind::CantileverBeam { .. } => "cantilever_beam",
            ScenarioKind::Vortex => "vortex",
            ScenarioKind::CollidingDisks => "colliding_disks",
        }
    }

    /// Looks a scenario up by name, with default options.
    pub fn from_name(name: &str) -> Option<ScenarioKind> {
        Self::all().into_iter().find(|k| k.name() == name)
    }

    /// Spatial dimension.
    pub fn dimension(&self) -> usize {
        match self {
            ScenarioKind::CantileverBeam { .. } => 3,
            _ => 2,
        }
    }

    /// Simulated time span (seconds).
    pub fn default_end_time(&self) -> f64 {
        match self {
            ScenarioKind::ElasticImpact { .. } => 4e-3,
            ScenarioKind::CantileverBeam { linear_solver } => match linear_solver {
                LinearSolverKind::Assembled => 0.5,
                LinearSolverKind::JacobianFree { .. } => 1.0,
            },
            ScenarioKind::Vortex => 1.0,
            ScenarioKind::CollidingDisks => 3.0,
        }
    }

    /// Frames saved per simulated second.
    pub fn default_fps(&self) -> f64 {
        match self {
            ScenarioKind::ElasticImpact { .. } => 12e3,
            ScenarioKind::CantileverBeam { .. } => 50.0,
            ScenarioKind::Vortex | ScenarioKind::CollidingDisks => 60.0,
        }
    }
}

fn default_resolution() -> f64 {
    1.0
}

/// Input of a simulation run (the CLI's `simulate` file).
///
/// ```toml
/// resolution = 0.5
/// end_time = 0.002
/// output = "out/impact.json"
///
/// [scenario]
/// kind = "elastic_impact"
/// transfer = { kind = "apic" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: ScenarioKind,
    /// Grid refinement factor; spacing is divided by it.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// Overrides the scenario's time span.
    #[serde(default)]
    pub end_time: Option<f64>,
    /// Stops after this many steps even if `end_time` is not reached.
    #[serde(default)]
    pub max_steps: Option<u64>,
    /// JSON frame output; no frames are written when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Overrides the scenario's save rate.
    #[serde(default)]
    pub fps: Option<f64>,
}

impl ScenarioConfig {
    pub fn new(scenario: ScenarioKind) -> Self {
        Self {
            scenario,
            resolution: default_resolution(),
            end_time: None,
            max_steps: None,
            output: None,
            fps: None,
        }
    }

    /// Builder: grid refinement factor.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Builder: step limit.
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn end_time(&self) -> f64 {
        self.end_time.unwrap_or_else(|| self.scenario.default_end_time())
    }

    pub fn fps(&self) -> f64 {
        self.fps.unwrap_or_else(|| self.scenario.default_fps())
    }

    pub fn validate(&self) -> GroveResult<()> {
        if self.resolution <= 0.0 || !self.resolution.is_finite() {
            return Err(GroveError::InvalidConfig(format!(
                "Resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.end_time() <= 0.0 {
            return Err(GroveError::InvalidConfig(format!(
                "End time must be positive, got {}",
                self.end_time()
            )));
        }
        if let ScenarioKind::ElasticImpact { transfer } = &self.scenario {
            transfer.validate(Some(0.25))?;
        }
        Ok(())
    }

    /// Builds grid, particles and solver.
    pub fn build(&self) -> GroveResult<ScenarioSetup> {
        self.validate()?;
        let res = self.resolution;
        let setup = match &self.scenario {
            ScenarioKind::ElasticImpact { transfer } => ScenarioSetup::Planar(elastic_impact(*transfer, res)?),
            ScenarioKind::CantileverBeam { linear_solver } => {
                ScenarioSetup::Spatial(cantilever_beam(linear_solver.clone(), res)?)
            }
            ScenarioKind::Vortex => ScenarioSetup::Planar(vortex(res)?),
            ScenarioKind::CollidingDisks => ScenarioSetup::Planar(colliding_disks(res)?),
        };
        Ok(setup)
    }
}

/// A fully specified scenario in `D` dimensions.
pub struct Scenario<const D: usize> {
    pub name: &'static str,
    pub grid: Grid<D>,
    pub particles: ParticleSet<D>,
    pub solver: Box<dyn SolverStrategy<D>>,
}

/// A built scenario, erased over dimension.
pub enum ScenarioSetup {
    Planar(Scenario<2>),
    Spatial(Scenario<3>),
}

impl ScenarioSetup {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioSetup::Planar(s) => s.name,
            ScenarioSetup::Spatial(s) => s.name,
        }
    }

    pub fn particle_count(&self) -> usize {
        match self {
            ScenarioSetup::Planar(s) => s.particles.len(),
            ScenarioSetup::Spatial(s) => s.particles.len(),
        }
    }
}

fn seed<const D: usize, F>(grid: &Grid<D>, per_cell: usize, props: &ElasticProperties, inside: F) -> GroveResult<ParticleSet<D>>
where
    F: Fn(&Vector<D>) -> bool,
{
    let (positions, volume) = grid_sample(grid, per_cell, inside);
    if positions.is_empty() {
        return Err(GroveError::InvalidConfig(
            "Scenario produced no particles; increase the resolution".into(),
        ));
    }
    ParticleSet::with_uniform_volume(positions, volume, props.density)
}

// ─── Elastic impact ───────────────────────────────────────────

/// Two rings (inner radius 0.03, outer 0.04) at `x = ±L/4` moving toward
/// each other at 30 m/s. Domain `L × W = 0.2 × 0.15`, `h = 1 mm`.
pub fn elastic_impact(transfer: TransferScheme, resolution: f64) -> GroveResult<Scenario<2>> {
    const L: f64 = 0.2;
    const W: f64 = 0.15;
    const R_IN: f64 = 0.03;
    const R_OUT: f64 = 0.04;
    const SPEED: f64 = 30.0;

    let props = database::elastic_ring();
    let grid = Grid::new(1.0e-3 / resolution, [(-L / 2.0, L / 2.0), (-W / 2.0, W / 2.0)])?;

    let in_ring = |x: &Vector<2>, cx: f64| {
        let r2 = (x[0] - cx).powi(2) + x[1].powi(2);
        R_IN * R_IN < r2 && r2 < R_OUT * R_OUT
    };
    let mut particles = seed(&grid, DEFAULT_PER_CELL, &props, |x| {
        in_ring(x, -L / 4.0) || in_ring(x, L / 4.0)
    })?;
    for (v, x) in particles.velocity.iter_mut().zip(&particles.position) {
        let sign = if x[0] < 0.0 { 1.0 } else { -1.0 };
        *v = Vector::<2>::new(sign * SPEED, 0.0);
    }

    let config = ExplicitConfig {
        transfer,
        timestep: TimeStepping::Cfl { courant: 0.8 },
        ..Default::default()
    };
    let solver = ExplicitSolver::new(
        config,
        InterpolationKind::Quadratic.build::<2>(),
        MaterialModel::NeoHookean.build::<2>(&props),
    )?;

    Ok(Scenario {
        name: "elastic_impact",
        grid,
        particles,
        solver: Box::new(solver),
    })
}

// ─── Cantilever beam ──────────────────────────────────────────

/// Beam `[0, 1] × [0.85, 1.15] × [−0.15, 0.15]` clamped on the `x = 0`
/// face, loaded by `g = 20` in `−y`. Grid `h = 0.05`.
pub fn cantilever_beam(linear_solver: LinearSolverKind, resolution: f64) -> GroveResult<Scenario<3>> {
    const GRAVITY: f64 = 20.0;

    let props = database::rubber();
    let mut grid = Grid::new(0.05 / resolution, [(0.0, 1.2), (0.0, 2.0), (-0.2, 0.2)])?;
    grid.fix_face(0, Side::Min)?;

    let particles = seed(&grid, DEFAULT_PER_CELL, &props, |x| {
        (0.0..1.0).contains(&x[0]) && (0.85..1.15).contains(&x[1]) && (-0.15..0.15).contains(&x[2])
    })?;

    let dt = match linear_solver {
        LinearSolverKind::Assembled => 0.05,
        LinearSolverKind::JacobianFree { .. } => 0.02,
    };
    let config = ImplicitConfig {
        dt,
        gravity: vec![0.0, -GRAVITY, 0.0],
        linear_solver,
        ..Default::default()
    };
    let solver = ImplicitSolver::new(
        config,
        InterpolationKind::CorrectedQuadratic.build::<3>(),
        MaterialModel::NeoHookean.build::<3>(&props),
    )?;

    Ok(Scenario {
        name: "cantilever_beam",
        grid,
        particles,
        solver: Box::new(solver),
    })
}

// ─── Vortex ───────────────────────────────────────────────────

/// Manufactured body force of the generalized vortex problem.
///
/// The annulus `R_i < R < R_o` rotates by `α(R, t) = g(t) h(R)` with
/// `g(t) = G sin(πt/T)` and `h(R) = 1 − 8s² + 16s⁴`,
/// `s = (R − R̄)/(R_i − R_o)`; the force is the one that makes this
/// motion an exact Neo-Hookean solution.
#[derive(Debug, Clone, Copy)]
pub struct VortexBodyForce {
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Peak rotation `G`.
    pub amplitude: f64,
    /// Time span `T` of one half period.
    pub period: f64,
    pub shear_modulus: f64,
    pub density: f64,
}

impl VortexBodyForce {
    pub fn contains(&self, x: &Vector<2>) -> bool {
        let r2 = x.norm_squared();
        self.inner_radius.powi(2) < r2 && r2 < self.outer_radius.powi(2)
    }

    /// Body acceleration at `x`, time `t`, in Cartesian components.
    pub fn acceleration(&self, x: &Vector<2>, t: f64) -> Vector<2> {
        let r = x.norm();
        let theta = x[1].atan2(x[0]);

        let width = self.inner_radius - self.outer_radius;
        let s = (r - 0.5 * (self.inner_radius + self.outer_radius)) / width;
        let h = 1.0 - 8.0 * s * s + 16.0 * s.powi(4);
        let h1 = (-16.0 * s + 64.0 * s.powi(3)) / width;
        let h2 = (-16.0 + 192.0 * s * s) / (width * width);

        let w = PI / self.period;
        let g = self.amplitude * (w * t).sin();
        let g1 = self.amplitude * w * (w * t).cos();
        let g2 = -self.amplitude * w * w * (w * t).sin();

        let c = self.shear_modulus / self.density;
        let alpha = g * h;
        let b_r = (c * (3.0 * g * h1 + r * g * h2) - r * g2 * h) * alpha.sin()
            + (c * r * (g * h1).powi(2) - r * (g1 * h).powi(2)) * alpha.cos();
        let b_t = (-c * (3.0 * g * h1 + r * g * h2) + r * g2 * h) * alpha.cos()
            + (c * r * (g * h1).powi(2) + r * (g1 * h).powi(2)) * alpha.sin();

        let (sin, cos) = theta.sin_cos();
        Vector::<2>::new(cos * b_r - sin * b_t, sin * b_r + cos * b_t)
    }
}

impl GridBodyForce<2> for VortexBodyForce {
    fn apply(&self, time: f64, grid: &mut Grid<2>) {
        for (b, x) in grid.body.iter_mut().zip(&grid.position) {
            if self.contains(x) {
                *b = self.acceleration(x, time);
            }
        }
    }
}

/// Annulus `0.75 < R < 1.25` in `[−1.5, 1.5]²`, one particle per cell,
/// `h = 0.02`, linear kernel. Nodes outside the annulus are fixed.
pub fn vortex(resolution: f64) -> GroveResult<Scenario<2>> {
    let props = database::soft_tissue();
    let force = VortexBodyForce {
        inner_radius: 0.75,
        outer_radius: 1.25,
        amplitude: PI,
        period: 1.0,
        shear_modulus: props.mu,
        density: props.density,
    };

    let mut grid = Grid::new(0.02 / resolution, [(-1.5, 1.5), (-1.5, 1.5)])?;
    for i in 0..grid.len() {
        if !force.contains(&grid.position[i]) {
            grid.fix_node(i);
        }
    }
    let particles = seed(&grid, 1, &props, |x| force.contains(x))?;

    let solver = TotalLagrangianSolver::new(
        TotalLagrangianConfig::default(),
        InterpolationKind::Linear.build::<2>(),
        MaterialModel::NeoHookean.build::<2>(&props),
    )?
    .with_body_force(force);

    Ok(Scenario {
        name: "vortex",
        grid,
        particles,
        solver: Box::new(solver),
    })
}

// ─── Colliding disks ──────────────────────────────────────────

/// Disks of radius 0.2 centred at `(r, r)` and `(1−r, 1−r)` in the unit
/// square, moving toward each other at `±(0.1, 0.1)`. `h = 0.05`,
/// `Δt = 10⁻³`, linear kernel, FLIP(1).
pub fn colliding_disks(resolution: f64) -> GroveResult<Scenario<2>> {
    const RADIUS: f64 = 0.2;
    const SPEED: f64 = 0.1;

    let props = database::gel();
    let grid = Grid::new(0.05 / resolution, [(0.0, 1.0), (0.0, 1.0)])?;

    let lower = Vector::<2>::new(RADIUS, RADIUS);
    let upper = Vector::<2>::new(1.0 - RADIUS, 1.0 - RADIUS);
    let mut particles = seed(&grid, DEFAULT_PER_CELL, &props, |x| {
        (x - lower).norm() < RADIUS || (x - upper).norm() < RADIUS
    })?;
    for (v, x) in particles.velocity.iter_mut().zip(&particles.position) {
        let sign = if (x - lower).norm() < RADIUS { 1.0 } else { -1.0 };
        *v = Vector::<2>::new(SPEED, SPEED) * sign;
    }

    let config = ExplicitConfig {
        transfer: TransferScheme::Flip { alpha: 1.0 },
        timestep: TimeStepping::Fixed { dt: 1e-3 },
        ..Default::default()
    };
    let solver = ExplicitSolver::new(
        config,
        InterpolationKind::Linear.build::<2>(),
        MaterialModel::NeoHookean.build::<2>(&props),
    )?;

    Ok(Scenario {
        name: "colliding_disks",
        grid,
        particles,
        solver: Box::new(solver),
    })
}
