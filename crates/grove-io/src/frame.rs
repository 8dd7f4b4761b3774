//! Export frame types.
//!
//! A frame is a flat, serializable snapshot: every field stores its
//! values row-major, `components` numbers per particle or node.

use serde::{Deserialize, Serialize};

use grove_grid::Grid;
use grove_math::Vector;
use grove_solver::ParticleSet;

/// One named array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Numbers per entry (1 for scalars, `D` for vectors).
    pub components: usize,
    pub values: Vec<f64>,
}

impl Field {
    pub fn scalar(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            values,
        }
    }

    /// Flattens a slice of fixed-size vectors.
    pub fn vector<const D: usize>(name: impl Into<String>, data: &[Vector<D>]) -> Self {
        Self {
            name: name.into(),
            components: D,
            values: data.iter().flat_map(|v| v.iter().copied()).collect(),
        }
    }

    /// Number of entries (particles or nodes) the field covers.
    pub fn len(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Snapshot of a simulation at one save point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub step: u64,
    pub time: f64,
    pub particle_count: usize,
    pub node_count: usize,
    pub particle_fields: Vec<Field>,
    pub node_fields: Vec<Field>,
}

impl Frame {
    pub fn new(step: u64, time: f64, particle_count: usize, node_count: usize) -> Self {
        Self {
            step,
            time,
            particle_count,
            node_count,
            particle_fields: Vec::new(),
            node_fields: Vec::new(),
        }
    }

    /// Standard capture: particle position, velocity and von Mises stress,
    /// node mass and velocity.
    pub fn capture<const D: usize>(step: u64, time: f64, particles: &ParticleSet<D>, grid: &Grid<D>) -> Self {
        let von_mises = (0..particles.len()).map(|p| particles.von_mises(p)).collect();
        let mut frame = Self::new(step, time, particles.len(), grid.len());
        frame.particle_fields = vec![
            Field::vector("position", &particles.position),
            Field::vector("velocity", &particles.velocity),
            Field::scalar("von_mises", von_mises),
        ];
        frame.node_fields = vec![
            Field::scalar("mass", grid.mass.clone()),
            Field::vector("velocity", &grid.velocity),
        ];
        frame
    }

    pub fn particle_field(&self, name: &str) -> Option<&Field> {
        self.particle_fields.iter().find(|f| f.name == name)
    }

    pub fn node_field(&self, name: &str) -> Option<&Field> {
        self.node_fields.iter().find(|f| f.name == name)
    }
}
