//! Strand: distributed stencil-field simulation on a domain-decomposed
//! grid.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Strand sub-crates, plus [`noise`] for writing seeded
//! initial conditions. It also builds the `strand` command-line runner.
//!
//! # Quick start
//!
//! ```rust
//! use strand::prelude::*;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let init = dir.path().join("init.chk");
//! let global = GridDims::new(&[16, 16]).unwrap();
//! strand::noise::write_noise_initial(&init, global, &["phi"], &NoiseSpec::default()).unwrap();
//!
//! let params: Params = [
//!     ("init_file", init.to_str().unwrap()),
//!     ("checkpoint_file", dir.path().join("run.chk").to_str().unwrap()),
//!     ("nsteps", "20"),
//!     ("output_frequency", "10"),
//! ]
//! .into_iter()
//! .collect();
//! let source = ParamSource::Inline(params);
//!
//! let reports = LocalGroup::run(4, |comm| {
//!     Driver::new(&comm, Diffusion::default(), RunLog::discard()).run(&source)
//! })
//! .unwrap();
//! assert!(reports.iter().all(|r| r.as_ref().unwrap().checkpoints == 3));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strand-core` | Grid extents, field names, field buffers, parameters |
//! | [`comm`] | `strand-comm` | Process groups and collective helpers |
//! | [`decomp`] | `strand-decomp` | Domain decomposition: scatter, gather, share |
//! | [`store`] | `strand-store` | Checkpoint container |
//! | [`kernel`] | `strand-kernel` | Kernel trait and per-rank state |
//! | [`kernels`] | `strand-kernels` | Reference kernels (diffusion, Allen-Cahn) |
//! | [`engine`] | `strand-engine` | Time-stepping driver, timers, logging |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod noise;

/// Grid extents, field names, buffers, and parameters (`strand-core`).
pub use strand_core as types;

/// Process groups (`strand-comm`).
///
/// [`comm::LocalGroup`] runs every rank as a thread of this process;
/// with the `mpi` feature, `comm::MpiComm` runs one rank per MPI
/// process.
pub use strand_comm as comm;

/// Domain decomposition (`strand-decomp`).
pub use strand_decomp as decomp;

/// Checkpoint container (`strand-store`).
pub use strand_store as store;

/// Kernel trait and per-rank state (`strand-kernel`).
pub use strand_kernel as kernel;

/// Reference kernels (`strand-kernels`).
pub use strand_kernels as kernels;

/// Time-stepping driver (`strand-engine`).
pub use strand_engine as engine;

/// Common imports for typical Strand usage.
///
/// ```rust
/// use strand::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use strand_core::{FieldStack, GridDims, NameIndex, Params};

    // Process groups
    pub use strand_comm::{CommError, Communicator, LocalComm, LocalGroup};

    // Decomposition
    pub use strand_decomp::{BoundaryPolicy, DecompConfig, DecompGrid, LocalLayout};

    // Store
    pub use strand_store::{checkpoint_path, CheckpointStore, OpenMode};

    // Kernels
    pub use strand_kernel::{Kernel, KernelError, KernelState};
    pub use strand_kernels::{AllenCahn, Diffusion};

    // Engine
    pub use strand_engine::{
        Driver, ParamLoading, ParamSource, RunConfig, RunError, RunLog, RunReport,
    };

    pub use crate::noise::NoiseSpec;
}
