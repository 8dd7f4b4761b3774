//! Degree-of-freedom map for the implicit solve.
//!
//! Each grid node contributes up to `D` unknowns (one per axis). A
//! component is active when its node carries mass and the component is
//! not Dirichlet-fixed. The map numbers active components node by node,
//! axis by axis.

use nalgebra::DVector;

use grove_math::Vector;

use crate::lattice::Grid;

/// Bijection between active nodal components and a reduced vector.
#[derive(Debug, Clone)]
pub struct DofMap<const D: usize> {
    /// `indices[node][axis]` is the reduced index, if active.
    indices: Vec<[Option<usize>; D]>,
    ndofs: usize,
}

impl<const D: usize> DofMap<D> {
    /// Builds the map from an activity mask `mask[node][axis]`.
    pub fn new(mask: &[[bool; D]]) -> Self {
        let mut ndofs = 0;
        let indices = mask
            .iter()
            .map(|node| {
                let mut slots = [None; D];
                for (slot, &active) in slots.iter_mut().zip(node.iter()) {
                    if active {
                        *slot = Some(ndofs);
                        ndofs += 1;
                    }
                }
                slots
            })
            .collect();
        Self { indices, ndofs }
    }

    /// Active components: `mass > 0` and not fixed.
    pub fn from_grid(grid: &Grid<D>) -> Self {
        let mask: Vec<[bool; D]> = grid
            .mass
            .iter()
            .zip(grid.fixed.iter())
            .map(|(&m, fixed)| {
                let mut active = [false; D];
                for a in 0..D {
                    active[a] = m > 0.0 && !fixed[a];
                }
                active
            })
            .collect();
        Self::new(&mask)
    }

    /// Number of reduced unknowns.
    pub fn ndofs(&self) -> usize {
        self.ndofs
    }

    /// Number of grid nodes the map was built for.
    pub fn node_count(&self) -> usize {
        self.indices.len()
    }

    /// Reduced index of component `axis` of `node`.
    #[inline]
    pub fn dof(&self, node: usize, axis: usize) -> Option<usize> {
        self.indices[node][axis]
    }

    /// Extracts the active components of a nodal field.
    pub fn gather(&self, field: &[Vector<D>]) -> DVector<f64> {
        let mut out = DVector::zeros(self.ndofs);
        for (node, slots) in self.indices.iter().enumerate() {
            for (axis, slot) in slots.iter().enumerate() {
                if let Some(k) = slot {
                    out[*k] = field[node][axis];
                }
            }
        }
        out
    }

    /// Writes a reduced vector into the active components of a nodal
    /// field. Inactive components are set to zero.
    pub fn scatter(&self, values: &DVector<f64>, field: &mut [Vector<D>]) {
        for (node, slots) in self.indices.iter().enumerate() {
            for (axis, slot) in slots.iter().enumerate() {
                field[node][axis] = match slot {
                    Some(k) => values[*k],
                    None => 0.0,
                };
            }
        }
    }
}
