//! Per-particle interpolation weights.

use rayon::prelude::*;

use grove_grid::Grid;
use grove_math::Vector;
use grove_types::GroveResult;

use crate::interpolation::Interpolation;

/// Weight of one node for one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight<const D: usize> {
    /// Linear grid node index.
    pub node: usize,
    /// Shape function value `N_i(x_p)`.
    pub n: f64,
    /// Shape function gradient `∇N_i(x_p)`.
    pub grad: Vector<D>,
}

/// All node weights of one particle. The buffer is reused across steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MpValue<const D: usize> {
    weights: Vec<Weight<D>>,
    truncated: bool,
}

impl<const D: usize> MpValue<D> {
    pub fn new() -> Self {
        Self {
            weights: Vec::new(),
            truncated: false,
        }
    }

    /// Empties the buffer, keeping its capacity.
    pub fn clear(&mut self) {
        self.weights.clear();
        self.truncated = false;
    }

    pub fn push(&mut self, weight: Weight<D>) {
        self.weights.push(weight);
    }

    pub fn weights(&self) -> &[Weight<D>] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [Weight<D>] {
        &mut self.weights
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Weight<D>> {
        self.weights.iter()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Whether the grid boundary cut the kernel's stencil.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn set_truncated(&mut self, truncated: bool) {
        self.truncated = truncated;
    }

    /// `Σ N_i`.
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().map(|w| w.n).sum()
    }
}

impl<'a, const D: usize> IntoIterator for &'a MpValue<D> {
    type Item = &'a Weight<D>;
    type IntoIter = std::slice::Iter<'a, Weight<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.weights.iter()
    }
}

/// The weight store: one [`MpValue`] per particle.
#[derive(Debug, Clone)]
pub struct MpValues<const D: usize> {
    values: Vec<MpValue<D>>,
}

impl<const D: usize> MpValues<D> {
    pub fn new(particle_count: usize) -> Self {
        Self {
            values: vec![MpValue::new(); particle_count],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, particle: usize) -> &MpValue<D> {
        &self.values[particle]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MpValue<D>> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[MpValue<D>] {
        &self.values
    }

    /// Recomputes every particle's weights at `positions`.
    ///
    /// Particles are independent, so this runs on the rayon pool. The
    /// first support error encountered aborts the refresh.
    pub fn update_all(
        &mut self,
        interp: &dyn Interpolation<D>,
        positions: &[Vector<D>],
        grid: &Grid<D>,
    ) -> GroveResult<()> {
        self.values
            .par_iter_mut()
            .zip(positions.par_iter())
            .enumerate()
            .try_for_each(|(p, (mp, x))| interp.evaluate(p, x, grid, mp))
    }
}
