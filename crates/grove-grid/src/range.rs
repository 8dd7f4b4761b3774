//! Rectangular ranges of grid nodes.

/// A box `lo[a]..hi[a]` of node coordinates on a lattice with `dims`
/// nodes per axis. Iteration is column-major, matching node indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange<const D: usize> {
    lo: [usize; D],
    hi: [usize; D],
    dims: [usize; D],
    truncated: bool,
}

impl<const D: usize> NodeRange<D> {
    pub fn new(lo: [usize; D], hi: [usize; D], dims: [usize; D], truncated: bool) -> Self {
        Self {
            lo,
            hi,
            dims,
            truncated,
        }
    }

    pub fn empty(dims: [usize; D]) -> Self {
        Self {
            lo: [0; D],
            hi: [0; D],
            dims,
            truncated: true,
        }
    }

    /// Lower corner (inclusive).
    pub fn lo(&self) -> [usize; D] {
        self.lo
    }

    /// Upper corner (exclusive).
    pub fn hi(&self) -> [usize; D] {
        self.hi
    }

    /// Whether the lattice boundary cut off part of the support.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        (0..D).map(|a| self.hi[a].saturating_sub(self.lo[a])).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(linear_index, coords)` over the range.
    pub fn iter(&self) -> NodeRangeIter<D> {
        NodeRangeIter {
            range: *self,
            current: self.lo,
            done: self.is_empty(),
        }
    }

    fn linear_index(&self, coords: &[usize; D]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for a in 0..D {
            index += coords[a] * stride;
            stride *= self.dims[a];
        }
        index
    }
}

impl<const D: usize> IntoIterator for &NodeRange<D> {
    type Item = (usize, [usize; D]);
    type IntoIter = NodeRangeIter<D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`NodeRange`].
#[derive(Debug, Clone)]
pub struct NodeRangeIter<const D: usize> {
    range: NodeRange<D>,
    current: [usize; D],
    done: bool,
}

impl<const D: usize> Iterator for NodeRangeIter<D> {
    type Item = (usize, [usize; D]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let coords = self.current;
        let item = (self.range.linear_index(&coords), coords);

        // Odometer increment, axis 0 fastest
        self.done = true;
        for a in 0..D {
            self.current[a] += 1;
            if self.current[a] < self.range.hi[a] {
                self.done = false;
                break;
            }
            self.current[a] = self.range.lo[a];
        }

        Some(item)
    }
}
