//! Per-rank buffers handed to a kernel.

use strand_core::{FieldStack, NameIndex};
use strand_decomp::LocalLayout;

use crate::error::KernelError;

/// The buffers a [`Kernel`](crate::Kernel) reads and mutates on one rank.
///
/// Holds one [`FieldStack`] each for the tracked fields, the chemical
/// potentials, and the mobilities. All three have one ghost-padded
/// buffer per field, laid out by [`layout`](Self::layout) and indexed
/// in the order of [`names`](Self::names).
///
/// Ghost cells of the fields are valid at the start of every
/// [`apply`](crate::Kernel::apply); the driver exchanges them after
/// each step. Ghost cells of the other two stacks are never exchanged.
pub struct KernelState<'a> {
    fields: &'a mut FieldStack,
    chem_pot: &'a mut FieldStack,
    mobility: &'a mut FieldStack,
    layout: &'a LocalLayout,
    names: &'a NameIndex,
    step: u64,
}

impl<'a> KernelState<'a> {
    /// Assemble the state for one kernel call.
    pub fn new(
        fields: &'a mut FieldStack,
        chem_pot: &'a mut FieldStack,
        mobility: &'a mut FieldStack,
        layout: &'a LocalLayout,
        names: &'a NameIndex,
        step: u64,
    ) -> Self {
        Self {
            fields,
            chem_pot,
            mobility,
            layout,
            names,
            step,
        }
    }

    /// The tracked fields.
    pub fn fields(&self) -> &FieldStack {
        &*self.fields
    }

    /// Mutable access to the tracked fields.
    pub fn fields_mut(&mut self) -> &mut FieldStack {
        &mut *self.fields
    }

    /// Chemical-potential buffers.
    pub fn chem_pot(&self) -> &FieldStack {
        &*self.chem_pot
    }

    /// Mutable access to the chemical-potential buffers.
    pub fn chem_pot_mut(&mut self) -> &mut FieldStack {
        &mut *self.chem_pot
    }

    /// Mobility buffers.
    pub fn mobility(&self) -> &FieldStack {
        &*self.mobility
    }

    /// Mutable access to the mobility buffers.
    pub fn mobility_mut(&mut self) -> &mut FieldStack {
        &mut *self.mobility
    }

    /// All three stacks at once, for updates that read one while
    /// writing another.
    pub fn split_mut(&mut self) -> (&mut FieldStack, &mut FieldStack, &mut FieldStack) {
        (
            &mut *self.fields,
            &mut *self.chem_pot,
            &mut *self.mobility,
        )
    }

    /// Local buffer layout.
    pub fn layout(&self) -> &LocalLayout {
        self.layout
    }

    /// Field names, in stack order.
    pub fn names(&self) -> &NameIndex {
        self.names
    }

    /// Step being computed; 0 during preprocessing and the last step
    /// during postprocessing.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Check that every interior cell of every field is finite.
    pub fn check_finite(&self) -> Result<(), KernelError> {
        for (f, field) in self.fields.fields().enumerate() {
            let mut bad = None;
            self.layout.for_each_interior(|_, idx| {
                if bad.is_none() && !field[idx].is_finite() {
                    bad = Some(idx);
                }
            });
            if let Some(cell) = bad {
                let field = self
                    .names
                    .name(f)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("#{f}"));
                return Err(KernelError::NonFinite { field, cell });
            }
        }
        Ok(())
    }
}
