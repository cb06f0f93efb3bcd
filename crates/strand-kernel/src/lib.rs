//! Physics-kernel interface for Strand simulations.
//!
//! A [`Kernel`] is the replaceable numerical update the driver calls
//! once per step. It sees only its own rank's ghost-padded buffers,
//! bundled in a [`KernelState`], and never communicates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod kernel;
pub mod state;

pub use error::KernelError;
pub use kernel::Kernel;
pub use state::KernelState;
