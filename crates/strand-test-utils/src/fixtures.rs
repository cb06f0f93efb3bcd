//! Reusable kernel test fixtures.
//!
//! - [`CountingKernel`]: adds a constant to every interior cell each
//!   step and counts its calls.
//! - [`FailingKernel`]: fails deterministically at a chosen point.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strand_core::Params;
use strand_kernel::{Kernel, KernelError, KernelState};

/// Call counters shared by every rank's [`CountingKernel`].
#[derive(Debug, Default)]
pub struct CallCounts {
    preprocess: AtomicUsize,
    apply: AtomicUsize,
    postprocess: AtomicUsize,
}

impl CallCounts {
    pub fn preprocess(&self) -> usize {
        self.preprocess.load(Ordering::SeqCst)
    }

    pub fn apply(&self) -> usize {
        self.apply.load(Ordering::SeqCst)
    }

    pub fn postprocess(&self) -> usize {
        self.postprocess.load(Ordering::SeqCst)
    }
}

/// Adds `increment` to every interior cell of every field per step.
///
/// After step `s` a cell holds its initial value plus `s * increment`,
/// which makes checkpoint contents predictable. Fails if the driver
/// presents steps out of order.
pub struct CountingKernel {
    pub increment: f64,
    pub ghost_width: usize,
    calls: Arc<CallCounts>,
    next_step: u64,
}

impl CountingKernel {
    pub fn new(increment: f64, calls: Arc<CallCounts>) -> Self {
        Self {
            increment,
            ghost_width: 1,
            calls,
            next_step: 1,
        }
    }
}

impl Kernel for CountingKernel {
    fn name(&self) -> &str {
        "counting"
    }

    fn min_ghost_width(&self) -> usize {
        self.ghost_width
    }

    fn preprocess(
        &mut self,
        state: &mut KernelState<'_>,
        _params: &Params,
    ) -> Result<(), KernelError> {
        self.calls.preprocess.fetch_add(1, Ordering::SeqCst);
        state.mobility_mut().fill(1.0);
        Ok(())
    }

    fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        if state.step() != self.next_step {
            return Err(KernelError::ExecutionFailed {
                reason: format!("expected step {}, got {}", self.next_step, state.step()),
            });
        }
        self.next_step += 1;
        self.calls.apply.fetch_add(1, Ordering::SeqCst);

        let layout = *state.layout();
        let increment = self.increment;
        for field in state.fields_mut().fields_mut() {
            layout.for_each_interior(|_, idx| field[idx] += increment);
        }
        Ok(())
    }

    fn postprocess(&mut self, _state: &mut KernelState<'_>) -> Result<(), KernelError> {
        self.calls.postprocess.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Where a [`FailingKernel`] fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    Never,
    Preprocess,
    Step(u64),
    Postprocess,
}

/// Leaves fields unchanged and fails at its [`FailPoint`].
pub struct FailingKernel {
    pub fail_at: FailPoint,
}

impl FailingKernel {
    pub fn new(fail_at: FailPoint) -> Self {
        Self { fail_at }
    }

    fn failure(&self, phase: &str) -> KernelError {
        KernelError::ExecutionFailed {
            reason: format!("deliberate failure in {phase}"),
        }
    }
}

impl Kernel for FailingKernel {
    fn name(&self) -> &str {
        "failing"
    }

    fn preprocess(
        &mut self,
        _state: &mut KernelState<'_>,
        _params: &Params,
    ) -> Result<(), KernelError> {
        match self.fail_at {
            FailPoint::Preprocess => Err(self.failure("preprocess")),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, state: &mut KernelState<'_>) -> Result<(), KernelError> {
        match self.fail_at {
            FailPoint::Step(step) if step == state.step() => {
                Err(self.failure(&format!("step {step}")))
            }
            _ => Ok(()),
        }
    }

    fn postprocess(&mut self, _state: &mut KernelState<'_>) -> Result<(), KernelError> {
        match self.fail_at {
            FailPoint::Postprocess => Err(self.failure("postprocess")),
            _ => Ok(()),
        }
    }
}
