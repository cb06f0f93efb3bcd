//! Process-group communication for Strand simulations.
//!
//! Every cross-process interaction in a Strand run goes through the
//! [`Communicator`] trait: tagged point-to-point transfers of `f64`
//! buffers, byte broadcasts, barriers, and the whole-group abort.
//!
//! # Backends
//!
//! - [`LocalGroup`] / [`LocalComm`]: one OS thread per rank inside a
//!   single process, connected by crossbeam channels. Used by tests and
//!   by the single-node runner.
//! - `MpiComm` (feature `mpi`): one rank per MPI process.
//!
//! # Collective discipline
//!
//! Higher layers build collectives (scatter, gather, halo exchange) out
//! of these primitives. All ranks must issue the same collectives in
//! the same order; a rank that diverges blocks its peers until the
//! group is aborted.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collective;
pub mod communicator;
pub mod error;
pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

pub use collective::{broadcast_strings, broadcast_u64s, in_rank_order};
pub use communicator::{tags, Communicator, Tag, COORDINATOR};
pub use error::CommError;
pub use local::{AbortHandle, LocalComm, LocalGroup};
#[cfg(feature = "mpi")]
pub use crate::mpi::MpiComm;
