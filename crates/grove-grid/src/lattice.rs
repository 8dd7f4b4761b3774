//! The background grid.

use serde::{Deserialize, Serialize};

use grove_math::Vector;
use grove_types::{GroveError, GroveResult};

use crate::range::NodeRange;

/// Which end of an axis a face lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Min,
    Max,
}

/// Regular Cartesian lattice with per-node fields.
///
/// All accumulation fields start at zero and are only ever added to by
/// P2G, so [`Grid::clear`] must run before each scatter pass.
#[derive(Debug, Clone)]
pub struct Grid<const D: usize> {
    spacing: f64,
    origin: Vector<D>,
    dims: [usize; D],

    /// Node coordinates (read-only after construction).
    pub position: Vec<Vector<D>>,
    /// Nodal mass.
    pub mass: Vec<f64>,
    /// Guarded inverse mass: `1/m` where `m > 0`, else `0`.
    pub mass_inv: Vec<f64>,
    /// Nodal momentum `mv`.
    pub momentum: Vec<Vector<D>>,
    /// Current velocity.
    pub velocity: Vec<Vector<D>>,
    /// Velocity at the start of the step (`vⁿ`).
    pub velocity_prev: Vec<Vector<D>>,
    /// Current acceleration.
    pub acceleration: Vec<Vector<D>>,
    /// Acceleration at the start of the step (`aⁿ`).
    pub acceleration_prev: Vec<Vector<D>>,
    /// Mass-weighted acceleration `ma` (implicit scheme).
    pub mass_accel: Vec<Vector<D>>,
    /// Internal force, or total force for schemes that do not split it.
    pub force: Vec<Vector<D>>,
    /// External force.
    pub force_ext: Vec<Vector<D>>,
    /// Prescribed body acceleration field. Not cleared between steps.
    pub body: Vec<Vector<D>>,
    /// Nodal displacement (implicit scheme).
    pub displacement: Vec<Vector<D>>,
    /// Dirichlet mask per node and axis. Not cleared between steps.
    pub fixed: Vec<[bool; D]>,
}

impl<const D: usize> Grid<D> {
    /// Allocates a lattice with the given spacing over `axes[a] = (min, max)`.
    ///
    /// Each axis gets `round((max − min) / spacing) + 1` nodes starting at `min`.
    pub fn new(spacing: f64, axes: [(f64, f64); D]) -> GroveResult<Self> {
        if spacing <= 0.0 || !spacing.is_finite() {
            return Err(GroveError::InvalidGrid(format!(
                "Grid spacing must be positive, got {spacing}"
            )));
        }

        let mut dims = [0usize; D];
        let mut origin = Vector::<D>::zeros();
        for (a, &(min, max)) in axes.iter().enumerate() {
            if max <= min || !min.is_finite() || !max.is_finite() {
                return Err(GroveError::InvalidGrid(format!(
                    "Axis {a} has an empty range ({min}, {max})"
                )));
            }
            dims[a] = ((max - min) / spacing).round() as usize + 1;
            origin[a] = min;
        }

        let len: usize = dims.iter().product();
        let zeros = vec![Vector::<D>::zeros(); len];

        let mut grid = Self {
            spacing,
            origin,
            dims,
            position: zeros.clone(),
            mass: vec![0.0; len],
            mass_inv: vec![0.0; len],
            momentum: zeros.clone(),
            velocity: zeros.clone(),
            velocity_prev: zeros.clone(),
            acceleration: zeros.clone(),
            acceleration_prev: zeros.clone(),
            mass_accel: zeros.clone(),
            force: zeros.clone(),
            force_ext: zeros.clone(),
            body: zeros.clone(),
            displacement: zeros,
            fixed: vec![[false; D]; len],
        };

        for i in 0..len {
            let coords = grid.node_coords(i);
            let mut x = grid.origin;
            for a in 0..D {
                x[a] += coords[a] as f64 * spacing;
            }
            grid.position[i] = x;
        }

        Ok(grid)
    }

    /// Node spacing `h`.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Coordinates of node `(0, …, 0)`.
    pub fn origin(&self) -> &Vector<D> {
        &self.origin
    }

    /// Number of nodes along each axis.
    pub fn dims(&self) -> [usize; D] {
        self.dims
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Linear index of the node at integer coordinates `coords`.
    pub fn node_index(&self, coords: [usize; D]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for a in 0..D {
            index += coords[a] * stride;
            stride *= self.dims[a];
        }
        index
    }

    /// Integer coordinates of node `index`.
    pub fn node_coords(&self, index: usize) -> [usize; D] {
        let mut coords = [0usize; D];
        let mut rest = index;
        for a in 0..D {
            coords[a] = rest % self.dims[a];
            rest /= self.dims[a];
        }
        coords
    }

    /// Whether `x` lies inside the lattice's bounding box.
    pub fn contains(&self, x: &Vector<D>) -> bool {
        (0..D).all(|a| {
            let max = self.origin[a] + (self.dims[a] - 1) as f64 * self.spacing;
            x[a] >= self.origin[a] && x[a] <= max
        })
    }

    /// Nodes whose normalized distance to `x` is strictly below `radius`
    /// (in cells) on every axis, clamped to the lattice.
    pub fn neighbors_of(&self, x: &Vector<D>, radius: f64) -> NodeRange<D> {
        let mut lo = [0usize; D];
        let mut hi = [0usize; D];
        let mut truncated = false;

        for a in 0..D {
            let xi = (x[a] - self.origin[a]) / self.spacing;
            let first = (xi - radius).floor() as i64 + 1;
            let last = (xi + radius).ceil() as i64 - 1;
            let clamped_first = first.max(0);
            let clamped_last = last.min(self.dims[a] as i64 - 1);
            truncated |= clamped_first != first || clamped_last != last;

            if clamped_last < clamped_first {
                return NodeRange::empty(self.dims);
            }
            lo[a] = clamped_first as usize;
            hi[a] = clamped_last as usize + 1;
        }

        NodeRange::new(lo, hi, self.dims, truncated)
    }

    /// Zeroes every accumulation field ahead of a P2G pass.
    ///
    /// Node positions, the body-acceleration field and the Dirichlet mask
    /// are preserved.
    pub fn clear(&mut self) {
        let zero = Vector::<D>::zeros();
        self.mass.fill(0.0);
        self.mass_inv.fill(0.0);
        for field in [
            &mut self.momentum,
            &mut self.velocity,
            &mut self.velocity_prev,
            &mut self.acceleration,
            &mut self.acceleration_prev,
            &mut self.mass_accel,
            &mut self.force,
            &mut self.force_ext,
            &mut self.displacement,
        ] {
            field.fill(zero);
        }
    }

    /// Recomputes `mass_inv` from `mass`; massless nodes get zero.
    pub fn update_mass_inverse(&mut self) {
        for (inv, &m) in self.mass_inv.iter_mut().zip(self.mass.iter()) {
            *inv = if m > 0.0 { 1.0 / m } else { 0.0 };
        }
    }

    /// Zeroes the fixed components of `v` and `a`.
    ///
    /// `vⁿ` is left alone so a FLIP increment `v − vⁿ` at a wall still
    /// removes the velocity the particle carried into it.
    pub fn enforce_dirichlet_velocity(&mut self) {
        for (i, mask) in self.fixed.iter().enumerate() {
            for (a, &fixed) in mask.iter().enumerate() {
                if fixed {
                    self.velocity[i][a] = 0.0;
                    self.acceleration[i][a] = 0.0;
                }
            }
        }
    }

    /// Zeroes the fixed components of `v`, `vⁿ`, `a` and `aⁿ`.
    ///
    /// Used where the previous-step kinematics enter a time integrator
    /// (Newmark), so pinned nodes start the step at rest.
    pub fn enforce_dirichlet_kinematics(&mut self) {
        self.enforce_dirichlet_velocity();
        for (i, mask) in self.fixed.iter().enumerate() {
            for (a, &fixed) in mask.iter().enumerate() {
                if fixed {
                    self.velocity_prev[i][a] = 0.0;
                    self.acceleration_prev[i][a] = 0.0;
                }
            }
        }
    }

    /// Fixes every component of every node on the given face.
    pub fn fix_face(&mut self, axis: usize, side: Side) -> GroveResult<()> {
        if axis >= D {
            return Err(GroveError::InvalidGrid(format!(
                "Axis {axis} out of range for a {D}-D grid"
            )));
        }
        let layer = match side {
            Side::Min => 0,
            Side::Max => self.dims[axis] - 1,
        };
        for i in 0..self.len() {
            if self.node_coords(i)[axis] == layer {
                self.fixed[i] = [true; D];
            }
        }
        Ok(())
    }

    /// Fixes every component of node `index`.
    pub fn fix_node(&mut self, index: usize) {
        self.fixed[index] = [true; D];
    }

    /// Whether component `axis` of node `index` is Dirichlet.
    pub fn is_fixed(&self, index: usize, axis: usize) -> bool {
        self.fixed[index][axis]
    }

    /// Sum of nodal masses.
    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }
}
