//! Particle state: SoA buffers for all per-particle data.
//!
//! Particles are created once by a sampler and never added or removed
//! during a run. Solvers read and write these buffers each timestep.

use serde::{Deserialize, Serialize};

use grove_math::tensor::{self, Matrix, Tangent, Vector};
use grove_types::{GroveError, GroveResult};

/// Which stress measure `ParticleSet::stress` currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressMeasure {
    /// Cauchy stress `σ` (explicit updated-Lagrangian schemes).
    #[default]
    Cauchy,
    /// Kirchhoff stress `τ = J σ` (implicit scheme).
    Kirchhoff,
    /// First Piola–Kirchhoff stress `P` (total-Lagrangian scheme).
    FirstPiola,
}

/// SoA particle buffers.
///
/// # Layout
///
/// Every array has length `len()`:
/// ```text
/// position:  [x0, x1, x2, ...]
/// velocity:  [v0, v1, v2, ...]
/// ...
/// ```
#[derive(Debug, Clone)]
pub struct ParticleSet<const D: usize> {
    // ─── Kinematics ───
    pub position: Vec<Vector<D>>,
    /// Reference (initial) position `X`.
    pub reference_position: Vec<Vector<D>>,
    pub velocity: Vec<Vector<D>>,
    pub acceleration: Vec<Vector<D>>,
    pub velocity_gradient: Vec<Matrix<D>>,
    pub displacement_gradient: Vec<Matrix<D>>,

    // ─── Mass and volume ───
    /// Constant after initialization.
    pub mass: Vec<f64>,
    /// Reference volume `V⁰`.
    pub initial_volume: Vec<f64>,
    /// Current volume `V = det(F) V⁰`.
    pub volume: Vec<f64>,

    // ─── Deformation and stress ───
    pub deformation_gradient: Vec<Matrix<D>>,
    pub stress: Vec<Matrix<D>>,
    pub stress_measure: StressMeasure,
    /// Cauchy `σ_zz` normal to the plane (plane strain, `D = 2` only).
    pub out_of_plane_stress: Vec<f64>,

    // ─── Scheme-specific ───
    /// APIC affine velocity matrix `B`.
    pub affine: Vec<Matrix<D>>,
    /// Prescribed body acceleration `b`.
    pub body_acceleration: Vec<Vector<D>>,
    /// Consistent tangent. Empty until an implicit step allocates it.
    pub tangent: Vec<Tangent<D>>,
}

impl<const D: usize> ParticleSet<D> {
    /// Creates particles at `positions` with per-particle volumes and a
    /// uniform density. Velocities start at zero and `F = I`.
    pub fn new(positions: Vec<Vector<D>>, volumes: Vec<f64>, density: f64) -> GroveResult<Self> {
        let n = positions.len();
        if volumes.len() != n {
            return Err(GroveError::InvalidConfig(format!(
                "Volume array length ({}) != particle count ({n})",
                volumes.len()
            )));
        }
        if density <= 0.0 || volumes.iter().any(|&v| v <= 0.0) {
            return Err(GroveError::InvalidConfig(
                "Particle density and volumes must be positive".into(),
            ));
        }

        let zero_v = Vector::<D>::zeros();
        let zero_m = Matrix::<D>::zeros();
        Ok(Self {
            reference_position: positions.clone(),
            position: positions,
            velocity: vec![zero_v; n],
            acceleration: vec![zero_v; n],
            velocity_gradient: vec![zero_m; n],
            displacement_gradient: vec![zero_m; n],
            mass: volumes.iter().map(|v| v * density).collect(),
            initial_volume: volumes.clone(),
            volume: volumes,
            deformation_gradient: vec![Matrix::<D>::identity(); n],
            stress: vec![zero_m; n],
            stress_measure: StressMeasure::default(),
            out_of_plane_stress: vec![0.0; n],
            affine: vec![zero_m; n],
            body_acceleration: vec![zero_v; n],
            tangent: Vec::new(),
        })
    }

    /// Same as [`ParticleSet::new`] with one volume for every particle.
    pub fn with_uniform_volume(positions: Vec<Vector<D>>, volume: f64, density: f64) -> GroveResult<Self> {
        let n = positions.len();
        Self::new(positions, vec![volume; n], density)
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Cauchy stress of particle `p`, whatever measure is stored.
    pub fn cauchy_stress(&self, p: usize) -> Matrix<D> {
        let f = &self.deformation_gradient[p];
        let j = tensor::det(f);
        match self.stress_measure {
            StressMeasure::Cauchy => self.stress[p],
            StressMeasure::Kirchhoff => self.stress[p] / j,
            StressMeasure::FirstPiola => self.stress[p] * f.transpose() / j,
        }
    }

    /// Von Mises equivalent stress of particle `p`. 2-D particles are
    /// treated as plane strain.
    pub fn von_mises(&self, p: usize) -> f64 {
        tensor::von_mises_plane_strain(&self.cauchy_stress(p), self.out_of_plane_stress[p])
    }

    /// `Σ ½ m |v|²`.
    pub fn kinetic_energy(&self) -> f64 {
        self.mass
            .iter()
            .zip(self.velocity.iter())
            .map(|(m, v)| 0.5 * m * v.norm_squared())
            .sum()
    }

    /// `Σ m v`.
    pub fn momentum(&self) -> Vector<D> {
        self.mass
            .iter()
            .zip(self.velocity.iter())
            .fold(Vector::<D>::zeros(), |acc, (m, v)| acc + v * *m)
    }

    /// `Σ m`.
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }
}
