//! Error types for the checkpoint container.

use std::fmt;
use std::io;

use strand_core::{DimsError, GridDims};

/// Errors from opening, reading, or writing a checkpoint container.
#[derive(Debug)]
pub enum StoreError {
    /// An I/O error occurred.
    Io(io::Error),
    /// The file does not start with the expected `b"STRD"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u8,
    },
    /// The container could not be decoded.
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// No dataset exists at the path.
    NotFound {
        /// The requested path.
        path: String,
    },
    /// No dataset lives under the group path.
    GroupNotFound {
        /// The requested group.
        path: String,
    },
    /// The path names a dataset, not a group.
    NotAGroup {
        /// The requested group.
        path: String,
    },
    /// A dataset already exists at the path; datasets are never replaced.
    DatasetExists {
        /// The rejected path.
        path: String,
    },
    /// The path would make a dataset and a group share a name.
    PathConflict {
        /// The rejected path.
        path: String,
        /// The existing dataset it collides with.
        existing: String,
    },
    /// The path is not a valid dataset or group path.
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// A write was attempted on a container opened for reading.
    ReadOnly,
    /// The stored grid has a different number of axes than the run.
    DimensionalityMismatch {
        /// Axes of the stored grid.
        stored: usize,
        /// Axes configured for the run.
        expected: usize,
    },
    /// A dataset does not have the container's volume.
    ShapeMismatch {
        /// Dataset path.
        path: String,
        /// Container volume.
        expected: usize,
        /// Dataset length.
        found: usize,
    },
    /// Append mode was asked for different extents than the container has.
    DimsMismatch {
        /// Extents stored in the container header.
        stored: GridDims,
        /// Extents requested by the caller.
        requested: GridDims,
    },
    /// Extents in the file are invalid.
    Dims(DimsError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"STRD\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed container: {detail}"),
            Self::NotFound { path } => write!(f, "no dataset at '{path}'"),
            Self::GroupNotFound { path } => write!(f, "no group at '{path}'"),
            Self::NotAGroup { path } => write!(f, "'{path}' is a dataset, not a group"),
            Self::DatasetExists { path } => write!(f, "dataset '{path}' already exists"),
            Self::PathConflict { path, existing } => {
                write!(f, "path '{path}' conflicts with dataset '{existing}'")
            }
            Self::InvalidPath { path, reason } => write!(f, "invalid path '{path}': {reason}"),
            Self::ReadOnly => write!(f, "container is open for reading only"),
            Self::DimensionalityMismatch { stored, expected } => write!(
                f,
                "stored grid has {stored} dimensions, run is configured for {expected}"
            ),
            Self::ShapeMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "dataset '{path}' has {found} values, container volume is {expected}"
            ),
            Self::DimsMismatch { stored, requested } => write!(
                f,
                "container extents {stored} differ from requested {requested}"
            ),
            Self::Dims(e) => write!(f, "invalid stored extents: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Dims(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<DimsError> for StoreError {
    fn from(e: DimsError) -> Self {
        Self::Dims(e)
    }
}
