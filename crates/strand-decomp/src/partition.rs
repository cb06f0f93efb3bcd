//! Splitting the global grid into per-rank subdomains.

use strand_core::{GridDims, MAX_DIMS};

use crate::error::DecompError;
use crate::topology::ProcessTopology;

/// Offset and length of part `coord` when `n` cells are split into
/// `parts` nearly equal runs.
///
/// The first `n % parts` runs get one extra cell.
///
/// ```
/// use strand_decomp::split_axis;
///
/// let runs: Vec<_> = (0..3).map(|c| split_axis(10, 3, c)).collect();
/// assert_eq!(runs, vec![(0, 4), (4, 3), (7, 3)]);
/// ```
pub fn split_axis(n: usize, parts: usize, coord: usize) -> (usize, usize) {
    let base = n / parts;
    let extra = n % parts;
    let len = base + usize::from(coord < extra);
    let offset = coord * base + coord.min(extra);
    (offset, len)
}

/// The block of the global grid owned by one rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subdomain {
    offset: [usize; MAX_DIMS],
    dims: GridDims,
}

impl Subdomain {
    /// Global coordinates of the first interior cell; inactive axes are 0.
    pub fn offset(&self) -> [usize; MAX_DIMS] {
        self.offset
    }

    /// Interior extents.
    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    /// Number of interior cells.
    pub fn volume(&self) -> usize {
        self.dims.volume()
    }
}

/// Subdomains of every rank of `grid`, in rank order.
///
/// Fails with [`DecompError::EmptySubdomain`] if an active axis has
/// fewer cells than processes.
pub fn partition(global: &GridDims, grid: &GridDims) -> Result<Vec<Subdomain>, DecompError> {
    if global.ndim() != grid.ndim() {
        return Err(DecompError::DimensionalityMismatch {
            grid: grid.ndim(),
            field: global.ndim(),
        });
    }
    for axis in 0..global.ndim() {
        if global.axis(axis) < grid.axis(axis) {
            return Err(DecompError::EmptySubdomain {
                axis,
                global: global.axis(axis),
                procs: grid.axis(axis),
            });
        }
    }
    (0..grid.volume())
        .map(|rank| {
            let coords = ProcessTopology::new(*grid, rank).coords();
            let mut offset = [0; MAX_DIMS];
            let mut extent = [1; MAX_DIMS];
            for axis in 0..global.ndim() {
                let (o, n) = split_axis(global.axis(axis), grid.axis(axis), coords[axis]);
                offset[axis] = o;
                extent[axis] = n;
            }
            Ok(Subdomain {
                offset,
                dims: GridDims::new(&extent[..global.ndim()])?,
            })
        })
        .collect()
}
