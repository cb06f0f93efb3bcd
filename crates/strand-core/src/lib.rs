//! Core types for the Strand field-simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other Strand crate: grid extents,
//! bounded field names and their index, the contiguous field-buffer
//! arena, the key/value parameter source, and the associated errors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dims;
pub mod error;
pub mod field;
pub mod name;
pub mod params;

pub use dims::{GridDims, MAX_DIMS};
pub use error::{AllocError, DimsError, NameError, ParamsError};
pub use field::FieldStack;
pub use name::{FieldName, NameIndex, MAX_FIELD_NAME_LEN};
pub use params::Params;
