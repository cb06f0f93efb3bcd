//! Contiguous storage for a run's per-field buffers.

use crate::error::AllocError;
use std::slice::{ChunksExact, ChunksExactMut};

/// A fixed number of equally sized `f64` buffers in one allocation.
///
/// One `FieldStack` holds every tracked field of one kind (field
/// values, chemical potentials, mobilities, or full-domain snapshots)
/// for the lifetime of a run. Buffer `i` belongs to the field at
/// position `i` of the run's [`NameIndex`](crate::NameIndex).
///
/// # Examples
///
/// ```
/// use strand_core::FieldStack;
///
/// let mut stack = FieldStack::try_new(2, 3).unwrap();
/// stack.field_mut(1).copy_from_slice(&[1.0, 2.0, 3.0]);
/// assert_eq!(stack.field(0), &[0.0, 0.0, 0.0]);
/// assert_eq!(stack.field(1), &[1.0, 2.0, 3.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldStack {
    data: Vec<f64>,
    field_len: usize,
    count: usize,
}

impl FieldStack {
    /// Allocate `count` zero-filled buffers of `field_len` elements.
    ///
    /// Uses fallible reservation so an oversized request surfaces as
    /// [`AllocError`] instead of aborting the process.
    pub fn try_new(count: usize, field_len: usize) -> Result<Self, AllocError> {
        let total = count
            .checked_mul(field_len)
            .ok_or(AllocError { elements: None })?;
        let mut data = Vec::new();
        data.try_reserve_exact(total).map_err(|_| AllocError {
            elements: Some(total),
        })?;
        data.resize(total, 0.0);
        Ok(Self {
            data,
            field_len,
            count,
        })
    }

    /// Number of buffers.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Elements per buffer.
    pub fn field_len(&self) -> usize {
        self.field_len
    }

    /// Buffer `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= count()`.
    pub fn field(&self, i: usize) -> &[f64] {
        assert!(i < self.count, "field {i} out of range ({})", self.count);
        &self.data[i * self.field_len..(i + 1) * self.field_len]
    }

    /// Mutable buffer `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= count()`.
    pub fn field_mut(&mut self, i: usize) -> &mut [f64] {
        assert!(i < self.count, "field {i} out of range ({})", self.count);
        &mut self.data[i * self.field_len..(i + 1) * self.field_len]
    }

    /// Iterate the buffers in order.
    pub fn fields(&self) -> ChunksExact<'_, f64> {
        self.data.chunks_exact(self.field_len.max(1))
    }

    /// Iterate the buffers mutably in order.
    pub fn fields_mut(&mut self) -> ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.field_len.max(1))
    }

    /// Fill every buffer with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// The whole allocation as one slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
