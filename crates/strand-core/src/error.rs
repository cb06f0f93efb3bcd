//! Error types for the core vocabulary: grid extents, field names,
//! buffer allocation, and parameter parsing.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors from constructing a [`GridDims`](crate::GridDims).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DimsError {
    /// No axes were supplied.
    NoAxes,
    /// More axes than [`MAX_DIMS`](crate::MAX_DIMS) were supplied.
    TooManyAxes {
        /// Number of axes supplied.
        found: usize,
    },
    /// An active axis has zero extent.
    ZeroExtent {
        /// Index of the offending axis.
        axis: usize,
    },
    /// The product of the extents does not fit in `usize`.
    VolumeOverflow,
}

impl fmt::Display for DimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAxes => write!(f, "grid must have at least one axis"),
            Self::TooManyAxes { found } => {
                write!(f, "grid has {found} axes, at most {} supported", crate::MAX_DIMS)
            }
            Self::ZeroExtent { axis } => write!(f, "axis {axis} has zero extent"),
            Self::VolumeOverflow => write!(f, "grid volume overflows usize"),
        }
    }
}

impl Error for DimsError {}

/// Errors from validating field names or building a
/// [`NameIndex`](crate::NameIndex).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty.
    Empty,
    /// The name exceeds [`MAX_FIELD_NAME_LEN`](crate::MAX_FIELD_NAME_LEN) bytes.
    TooLong {
        /// Length of the rejected name, in bytes.
        len: usize,
    },
    /// The name contains a path separator or NUL byte.
    InvalidCharacter {
        /// The rejected name.
        name: String,
        /// The offending character.
        ch: char,
    },
    /// The same name appears twice in a field table.
    Duplicate {
        /// The repeated name.
        name: String,
    },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "field name is empty"),
            Self::TooLong { len } => write!(
                f,
                "field name is {len} bytes, limit is {}",
                crate::MAX_FIELD_NAME_LEN
            ),
            Self::InvalidCharacter { name, ch } => {
                write!(f, "field name '{name}' contains invalid character {ch:?}")
            }
            Self::Duplicate { name } => write!(f, "duplicate field name '{name}'"),
        }
    }
}

impl Error for NameError {}

/// A buffer allocation could not be satisfied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocError {
    /// Number of `f64` elements requested, if it was representable.
    pub elements: Option<usize>,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.elements {
            Some(n) => write!(f, "failed to allocate {n} f64 elements"),
            None => write!(f, "requested buffer size overflows usize"),
        }
    }
}

impl Error for AllocError {}

/// Errors from reading or querying a [`Params`](crate::Params) source.
#[derive(Debug)]
pub enum ParamsError {
    /// The parameter file could not be read.
    Io(io::Error),
    /// A non-blank, non-comment line has no `=` separator.
    MissingSeparator {
        /// 1-based line number.
        line: usize,
        /// The line after whitespace removal.
        content: String,
    },
    /// A line has an empty key.
    EmptyKey {
        /// 1-based line number.
        line: usize,
    },
    /// A required key is absent.
    Missing {
        /// The missing key.
        key: String,
    },
    /// A value could not be parsed into the requested type.
    Invalid {
        /// The key whose value was rejected.
        key: String,
        /// The raw value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingSeparator { line, content } => {
                write!(f, "line {line}: expected key=value, got '{content}'")
            }
            Self::EmptyKey { line } => write!(f, "line {line}: empty key"),
            Self::Missing { key } => write!(f, "missing required parameter '{key}'"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid value '{value}' for '{key}': {reason}")
            }
        }
    }
}

impl Error for ParamsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParamsError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
