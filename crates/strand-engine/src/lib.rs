//! Time-stepping driver for Strand simulations.
//!
//! A [`Driver`] runs on every rank of a process group. It loads the
//! run's parameters, reads the initial fields on the coordinator,
//! decomposes the grid, and then steps the [`Kernel`](strand_kernel::Kernel)
//! with a halo exchange after every step and a checkpoint every
//! `output_frequency` steps.
//!
//! # Modules
//!
//! - [`config`]: [`RunConfig`] and its validation.
//! - [`startup`]: parameter distribution and the initial field table.
//! - [`driver`]: the step loop.
//! - [`timer`]: cumulative compute, communication, I/O, and total timers.
//! - [`progress`]: progress interval, remaining-time estimate, and
//!   elapsed-time breakdown.
//! - [`log`]: the run-scoped log sink.
//! - [`error`]: [`RunError`] and its abort codes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod error;
pub mod log;
pub mod progress;
pub mod startup;
pub mod timer;

pub use config::{ConfigError, RunConfig};
pub use driver::{Driver, RunReport};
pub use error::{RunError, StoreOp};
pub use log::{MemoryLog, RunLog};
pub use progress::{estimate_remaining, progress_interval, ElapsedBreakdown};
pub use startup::{ParamLoading, ParamSource};
pub use timer::{RunTimers, Stopwatch, TimerReport};
