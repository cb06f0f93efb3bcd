//! Checkpoint container for Strand simulations.
//!
//! A [`CheckpointStore`] is a single file holding full-domain `f64`
//! datasets at hierarchical paths such as `/phi/000003`. Datasets are
//! appended and never replaced, so a container that was being written
//! when a run died stays readable up to its last complete dataset.
//!
//! # Format
//!
//! ```text
//! [MAGIC "STRD"] [VERSION u8] [NDIM u8] [EXTENT u64 x NDIM]
//! [Record 1] [Record 2] ... [Record N]
//!
//! Record: [KIND u8 = 1] [PATH u32 len + UTF-8] [NDIM u8] [EXTENT u64 x NDIM]
//!         [VALUE f64 x volume]
//! ```
//!
//! All numbers are little-endian. All I/O uses the codec in [`codec`];
//! there is no serde dependency.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod path;
pub mod store;

pub use error::StoreError;
pub use path::checkpoint_path;
pub use store::{CheckpointStore, OpenMode};

/// Magic bytes at the start of every container.
pub const MAGIC: [u8; 4] = *b"STRD";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

/// Record kind tag for a dataset.
pub const RECORD_DATASET: u8 = 1;
