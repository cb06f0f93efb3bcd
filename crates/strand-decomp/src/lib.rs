//! Domain decomposition for Strand simulations.
//!
//! Splits a global 1 to 3 axis grid over the ranks of a process group
//! and moves field data between the coordinator's global arrays and
//! the ranks' ghost-padded local arrays.
//!
//! # Layers
//!
//! - [`create_process_grid`] arranges the group size on a process grid.
//! - [`partition`] splits the global grid into one [`Subdomain`] per
//!   rank with [`split_axis`].
//! - [`LocalLayout`] describes a rank's ghost-padded buffer.
//! - [`DecompGrid`] ties these together and provides the collectives
//!   [`scatter`](DecompGrid::scatter), [`gather`](DecompGrid::gather),
//!   and [`share`](DecompGrid::share).
//!
//! All arrays are row-major with axis 0 slowest. Ranks are laid out on
//! the process grid row-major with the last axis fastest.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod error;
pub mod grid;
pub mod layout;
pub mod partition;
pub mod topology;

pub use boundary::BoundaryPolicy;
pub use error::DecompError;
pub use grid::{DecompConfig, DecompGrid};
pub use layout::{LocalLayout, Region};
pub use partition::{partition, split_axis, Subdomain};
pub use topology::{create_process_grid, ProcessTopology, Side};
