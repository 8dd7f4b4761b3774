//! Regular particle seeding.

use grove_grid::Grid;
use grove_math::Vector;

/// Seeds `per_cell` particles per axis in every grid cell, at the centres
/// of the cell's sub-cells, keeping those for which `inside` holds.
///
/// Returns the positions and the volume each particle represents
/// (`h^D / per_cell^D`).
pub fn grid_sample<const D: usize, F>(grid: &Grid<D>, per_cell: usize, inside: F) -> (Vec<Vector<D>>, f64)
where
    F: Fn(&Vector<D>) -> bool,
{
    let per_cell = per_cell.max(1);
    let dp = grid.spacing() / per_cell as f64;
    let volume = dp.powi(D as i32);

    let mut counts = [0usize; D];
    for (a, n) in counts.iter_mut().enumerate() {
        *n = (grid.dims()[a].saturating_sub(1)) * per_cell;
    }
    if counts.iter().any(|&n| n == 0) {
        return (Vec::new(), volume);
    }

    let mut positions = Vec::new();
    let mut index = [0usize; D];
    loop {
        let mut x = *grid.origin();
        for a in 0..D {
            x[a] += (index[a] as f64 + 0.5) * dp;
        }
        if inside(&x) {
            positions.push(x);
        }

        // Odometer, axis 0 fastest.
        let mut a = 0;
        loop {
            index[a] += 1;
            if index[a] < counts[a] {
                break;
            }
            index[a] = 0;
            a += 1;
            if a == D {
                return (positions, volume);
            }
        }
    }
}

/// Particles per cell per axis used by the scenarios.
pub const DEFAULT_PER_CELL: usize = 2;
