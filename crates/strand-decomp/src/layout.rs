//! Ghost-padded local buffers and box copies between flat arrays.

use strand_core::dims::strides_of;
use strand_core::{GridDims, MAX_DIMS};

/// A half-open box `[lo, hi)` in padded three-axis coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Inclusive lower corner.
    pub lo: [usize; MAX_DIMS],
    /// Exclusive upper corner.
    pub hi: [usize; MAX_DIMS],
}

impl Region {
    /// Box from a corner and extents.
    pub fn at(lo: [usize; MAX_DIMS], extent: [usize; MAX_DIMS]) -> Self {
        let mut hi = lo;
        for axis in 0..MAX_DIMS {
            hi[axis] += extent[axis];
        }
        Self { lo, hi }
    }

    /// The whole of `shape`.
    pub fn whole(shape: [usize; MAX_DIMS]) -> Self {
        Self::at([0; MAX_DIMS], shape)
    }

    /// Same box with `axis` restricted to `[lo, hi)`.
    pub fn with_axis(mut self, axis: usize, lo: usize, hi: usize) -> Self {
        self.lo[axis] = lo;
        self.hi[axis] = hi;
        self
    }

    /// Extent along each axis.
    pub fn extent(&self) -> [usize; MAX_DIMS] {
        let mut e = [0; MAX_DIMS];
        for axis in 0..MAX_DIMS {
            e[axis] = self.hi[axis].saturating_sub(self.lo[axis]);
        }
        e
    }

    /// Number of cells.
    pub fn volume(&self) -> usize {
        self.extent().iter().product()
    }
}

/// Append the cells of `region` of a row-major `shape` array to `out`.
///
/// Cells are appended row-major, so packing a region and unpacking it
/// into an equally sized region of another array preserves order.
pub fn pack_region(shape: [usize; MAX_DIMS], src: &[f64], region: &Region, out: &mut Vec<f64>) {
    let strides = strides_of(shape);
    let row = region.hi[2] - region.lo[2];
    out.reserve(region.volume());
    for i in region.lo[0]..region.hi[0] {
        for j in region.lo[1]..region.hi[1] {
            let start = i * strides[0] + j * strides[1] + region.lo[2];
            out.extend_from_slice(&src[start..start + row]);
        }
    }
}

/// Overwrite the cells of `region` of a row-major `shape` array with
/// `data`, which must hold exactly `region.volume()` values.
pub fn unpack_region(shape: [usize; MAX_DIMS], dst: &mut [f64], region: &Region, data: &[f64]) {
    debug_assert_eq!(data.len(), region.volume());
    let strides = strides_of(shape);
    let row = region.hi[2] - region.lo[2];
    let mut rows = data.chunks_exact(row.max(1));
    for i in region.lo[0]..region.hi[0] {
        for j in region.lo[1]..region.hi[1] {
            let start = i * strides[0] + j * strides[1] + region.lo[2];
            if let Some(values) = rows.next() {
                dst[start..start + row].copy_from_slice(values);
            }
        }
    }
}

/// Set every cell of `region` to `value`.
pub fn fill_region(shape: [usize; MAX_DIMS], dst: &mut [f64], region: &Region, value: f64) {
    let strides = strides_of(shape);
    let row = region.hi[2] - region.lo[2];
    for i in region.lo[0]..region.hi[0] {
        for j in region.lo[1]..region.hi[1] {
            let start = i * strides[0] + j * strides[1] + region.lo[2];
            dst[start..start + row].fill(value);
        }
    }
}

/// Shape of one rank's local buffer: the interior plus `ghost` cells on
/// both sides of every active axis.
///
/// ```
/// use strand_core::GridDims;
/// use strand_decomp::LocalLayout;
///
/// let layout = LocalLayout::new(GridDims::new(&[4, 3]).unwrap(), 1);
/// assert_eq!(layout.padded_shape(), [6, 5, 1]);
/// assert_eq!(layout.padded_volume(), 30);
/// assert_eq!(layout.index([1, 1, 0]), 6);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalLayout {
    interior: GridDims,
    ghost: usize,
}

impl LocalLayout {
    /// Layout for an interior of `interior` cells and a ghost layer of
    /// width `ghost`.
    pub fn new(interior: GridDims, ghost: usize) -> Self {
        Self { interior, ghost }
    }

    /// Interior extents.
    pub fn interior(&self) -> &GridDims {
        &self.interior
    }

    /// Ghost width.
    pub fn ghost(&self) -> usize {
        self.ghost
    }

    /// Number of active axes.
    pub fn ndim(&self) -> usize {
        self.interior.ndim()
    }

    /// Padded extents; inactive axes are 1.
    pub fn padded_shape(&self) -> [usize; MAX_DIMS] {
        let mut shape = self.interior.padded();
        for axis in 0..self.ndim() {
            shape[axis] += 2 * self.ghost;
        }
        shape
    }

    /// Length of a local buffer.
    pub fn padded_volume(&self) -> usize {
        self.padded_shape().iter().product()
    }

    /// Row-major strides of the padded buffer.
    pub fn strides(&self) -> [usize; MAX_DIMS] {
        strides_of(self.padded_shape())
    }

    /// Buffer index of a padded coordinate.
    pub fn index(&self, coord: [usize; MAX_DIMS]) -> usize {
        let s = self.strides();
        coord[0] * s[0] + coord[1] * s[1] + coord[2] * s[2]
    }

    /// Padded coordinate of the first interior cell.
    pub fn interior_origin(&self) -> [usize; MAX_DIMS] {
        let mut lo = [0; MAX_DIMS];
        for l in lo.iter_mut().take(self.ndim()) {
            *l = self.ghost;
        }
        lo
    }

    /// The interior cells as a region of the padded buffer.
    pub fn interior_region(&self) -> Region {
        Region::at(self.interior_origin(), self.interior.padded())
    }

    /// The whole padded buffer as a region.
    pub fn padded_region(&self) -> Region {
        Region::whole(self.padded_shape())
    }

    /// Visit the buffer index of every interior cell, with its interior
    /// coordinate, in row-major order.
    pub fn for_each_interior(&self, mut f: impl FnMut([usize; MAX_DIMS], usize)) {
        let origin = self.interior_origin();
        let n = self.interior.padded();
        for i in 0..n[0] {
            for j in 0..n[1] {
                for k in 0..n[2] {
                    f(
                        [i, j, k],
                        self.index([i + origin[0], j + origin[1], k + origin[2]]),
                    );
                }
            }
        }
    }

    /// Copy the interior of `local` into a dense interior-sized vector.
    pub fn pack_interior(&self, local: &[f64], out: &mut Vec<f64>) {
        pack_region(self.padded_shape(), local, &self.interior_region(), out);
    }

    /// Overwrite the interior of `local` from a dense interior-sized slice.
    pub fn unpack_interior(&self, local: &mut [f64], data: &[f64]) {
        unpack_region(self.padded_shape(), local, &self.interior_region(), data);
    }
}
