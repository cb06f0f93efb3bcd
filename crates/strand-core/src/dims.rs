//! Grid extents over one to three axes.

use crate::error::DimsError;
use std::fmt;

/// Maximum number of grid axes.
pub const MAX_DIMS: usize = 3;

/// Extent of a regular grid along 1 to [`MAX_DIMS`] axes.
///
/// Only the first [`ndim`](GridDims::ndim) axes are active. Inactive
/// axes report an extent of 1, so code that iterates over all three
/// axes can treat every grid as 3D without special cases.
///
/// Linear indices are row-major: axis 0 varies slowest, the last
/// active axis fastest.
///
/// # Examples
///
/// ```
/// use strand_core::GridDims;
///
/// let dims = GridDims::new(&[4, 6]).unwrap();
/// assert_eq!(dims.ndim(), 2);
/// assert_eq!(dims.volume(), 24);
/// assert_eq!(dims.axis(2), 1);
/// assert_eq!(dims.linear_index([1, 2, 0]), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    ndim: usize,
    extent: [usize; MAX_DIMS],
}

impl GridDims {
    /// Build grid dims from the active extents.
    ///
    /// Fails if there are no axes, more than [`MAX_DIMS`] axes, any
    /// extent is zero, or the volume overflows.
    pub fn new(extent: &[usize]) -> Result<Self, DimsError> {
        if extent.is_empty() {
            return Err(DimsError::NoAxes);
        }
        if extent.len() > MAX_DIMS {
            return Err(DimsError::TooManyAxes {
                found: extent.len(),
            });
        }
        let mut padded = [1usize; MAX_DIMS];
        for (axis, &n) in extent.iter().enumerate() {
            if n == 0 {
                return Err(DimsError::ZeroExtent { axis });
            }
            padded[axis] = n;
        }
        padded
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or(DimsError::VolumeOverflow)?;
        Ok(Self {
            ndim: extent.len(),
            extent: padded,
        })
    }

    /// Number of active axes.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// The active extents.
    pub fn extent(&self) -> &[usize] {
        &self.extent[..self.ndim]
    }

    /// Extent along `axis`; 1 for inactive axes.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= MAX_DIMS`.
    pub fn axis(&self, axis: usize) -> usize {
        self.extent[axis]
    }

    /// All [`MAX_DIMS`] extents, inactive axes set to 1.
    pub fn padded(&self) -> [usize; MAX_DIMS] {
        self.extent
    }

    /// Number of cells.
    pub fn volume(&self) -> usize {
        self.extent.iter().product()
    }

    /// Row-major strides over the padded extents.
    pub fn strides(&self) -> [usize; MAX_DIMS] {
        strides_of(self.extent)
    }

    /// Linear row-major index of a padded coordinate.
    pub fn linear_index(&self, coord: [usize; MAX_DIMS]) -> usize {
        let s = self.strides();
        coord[0] * s[0] + coord[1] * s[1] + coord[2] * s[2]
    }

    /// Whether `axis` is active.
    pub fn is_active(&self, axis: usize) -> bool {
        axis < self.ndim
    }
}

/// Row-major strides for a padded 3-axis shape.
pub fn strides_of(shape: [usize; MAX_DIMS]) -> [usize; MAX_DIMS] {
    [shape[1] * shape[2], shape[2], 1]
}

impl fmt::Display for GridDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.extent().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{n}")?;
        }
        Ok(())
    }
}
