//! Process grids and rank coordinates.

use smallvec::SmallVec;
use strand_core::{GridDims, MAX_DIMS};

use crate::error::DecompError;

/// Arrange `nprocs` processes on an `ndim`-axis grid.
///
/// `requested` is either empty (every axis free) or has exactly `ndim`
/// entries, where `0` marks a free axis and any other value fixes that
/// axis. The processes left over after the fixed axes are split over
/// the free axes by handing prime factors, largest first, to the free
/// axis with the fewest processes so far. Free axes end up in
/// non-increasing order.
///
/// # Examples
///
/// ```
/// use strand_decomp::create_process_grid;
///
/// assert_eq!(create_process_grid(6, 2, &[]).unwrap().extent(), &[3, 2]);
/// assert_eq!(create_process_grid(12, 3, &[]).unwrap().extent(), &[3, 2, 2]);
/// assert_eq!(create_process_grid(8, 2, &[0, 4]).unwrap().extent(), &[2, 4]);
/// assert!(create_process_grid(6, 2, &[4, 0]).is_err());
/// ```
pub fn create_process_grid(
    nprocs: usize,
    ndim: usize,
    requested: &[usize],
) -> Result<GridDims, DecompError> {
    let invalid = |reason: String| DecompError::InvalidProcessGrid {
        nprocs,
        requested: requested.to_vec(),
        reason,
    };
    if nprocs == 0 {
        return Err(invalid("the group is empty".to_string()));
    }
    if ndim == 0 || ndim > MAX_DIMS {
        return Err(invalid(format!("{ndim} axes requested, 1 to {MAX_DIMS} supported")));
    }
    if !requested.is_empty() && requested.len() != ndim {
        return Err(DecompError::DimensionalityMismatch {
            grid: requested.len(),
            field: ndim,
        });
    }

    let mut grid: SmallVec<[usize; MAX_DIMS]> = if requested.is_empty() {
        SmallVec::from_elem(0, ndim)
    } else {
        SmallVec::from_slice(requested)
    };
    let fixed: usize = grid.iter().filter(|&&p| p != 0).product();
    if nprocs % fixed != 0 {
        return Err(invalid(format!(
            "fixed axes use {fixed} processes, which does not divide {nprocs}"
        )));
    }
    let free: SmallVec<[usize; MAX_DIMS]> = (0..ndim).filter(|&a| grid[a] == 0).collect();
    let remaining = nprocs / fixed;
    if free.is_empty() {
        if remaining != 1 {
            return Err(invalid(format!(
                "fixed axes use {fixed} processes, not {nprocs}"
            )));
        }
        return Ok(GridDims::new(&grid)?);
    }

    let mut shares: SmallVec<[usize; MAX_DIMS]> = SmallVec::from_elem(1, free.len());
    for p in prime_factors(remaining).into_iter().rev() {
        if let Some(smallest) = shares.iter_mut().min_by_key(|s| **s) {
            *smallest *= p;
        }
    }
    shares.sort_unstable_by(|a, b| b.cmp(a));
    for (&axis, share) in free.iter().zip(shares) {
        grid[axis] = share;
    }
    Ok(GridDims::new(&grid)?)
}

/// Prime factors of `n` in non-decreasing order.
fn prime_factors(mut n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut p = 2;
    while p * p <= n {
        while n % p == 0 {
            out.push(p);
            n /= p;
        }
        p += 1;
    }
    if n > 1 {
        out.push(n);
    }
    out
}

/// Side of a subdomain along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Toward coordinate 0.
    Low,
    /// Toward the last coordinate.
    High,
}

impl Side {
    /// `0` for [`Side::Low`], `1` for [`Side::High`].
    pub fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

/// One rank's place in the process grid.
///
/// Ranks map to grid coordinates row-major, last axis fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessTopology {
    grid: GridDims,
    rank: usize,
    coords: [usize; MAX_DIMS],
}

impl ProcessTopology {
    /// Place `rank` on `grid`.
    ///
    /// # Panics
    ///
    /// Panics if `rank >= grid.volume()`.
    pub fn new(grid: GridDims, rank: usize) -> Self {
        assert!(
            rank < grid.volume(),
            "rank {rank} outside process grid {grid}"
        );
        let coords = coords_of(&grid, rank);
        Self { grid, rank, coords }
    }

    /// The process grid.
    pub fn grid(&self) -> &GridDims {
        &self.grid
    }

    /// This rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// This rank's grid coordinates; inactive axes are 0.
    pub fn coords(&self) -> [usize; MAX_DIMS] {
        self.coords
    }

    /// Grid coordinates of any rank.
    pub fn coords_of(&self, rank: usize) -> [usize; MAX_DIMS] {
        coords_of(&self.grid, rank)
    }

    /// Rank at grid coordinates.
    pub fn rank_of(&self, coords: [usize; MAX_DIMS]) -> usize {
        self.grid.linear_index(coords)
    }

    /// Neighbor of this rank across `side` of `axis`.
    ///
    /// At the edge of the grid the neighbor wraps when `periodic` and
    /// is `None` otherwise. Inactive axes have no neighbors.
    pub fn neighbor(&self, axis: usize, side: Side, periodic: bool) -> Option<usize> {
        if !self.grid.is_active(axis) {
            return None;
        }
        let p = self.grid.axis(axis);
        let c = self.coords[axis];
        let next = match side {
            Side::Low if c > 0 => c - 1,
            Side::Low if periodic => p - 1,
            Side::High if c + 1 < p => c + 1,
            Side::High if periodic => 0,
            _ => return None,
        };
        let mut coords = self.coords;
        coords[axis] = next;
        Some(self.rank_of(coords))
    }
}

fn coords_of(grid: &GridDims, rank: usize) -> [usize; MAX_DIMS] {
    let strides = grid.strides();
    let mut coords = [0; MAX_DIMS];
    for axis in 0..MAX_DIMS {
        coords[axis] = (rank / strides[axis]) % grid.axis(axis);
    }
    coords
}
