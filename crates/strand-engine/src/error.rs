//! The umbrella error of a run and its abort codes.

use std::error::Error;
use std::fmt;
use std::io;

use strand_comm::CommError;
use strand_core::{AllocError, NameError};
use strand_decomp::DecompError;
use strand_kernel::KernelError;
use strand_store::StoreError;

use crate::config::ConfigError;

/// The checkpoint-store operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// Opening a container.
    Open,
    /// Listing a group.
    List,
    /// Reading a dataset.
    Read,
    /// Writing a dataset.
    Write,
    /// Closing a container.
    Close,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::List => "list",
            Self::Read => "read",
            Self::Write => "write",
            Self::Close => "close",
        };
        f.write_str(s)
    }
}

/// Why a run stopped.
///
/// Every variant maps to a stable [`code`](RunError::code), logged on
/// the failing rank and passed to the whole-group abort.
#[derive(Debug)]
pub enum RunError {
    /// Bad configuration or parameters.
    Config(ConfigError),
    /// The decomposition could not be set up or a collective failed.
    Decomp(DecompError),
    /// A checkpoint or initial-condition store operation failed.
    Store {
        /// The failing operation.
        op: StoreOp,
        /// The container involved.
        path: String,
        /// The store's error.
        source: StoreError,
    },
    /// The initial-condition container holds an unusable field name.
    FieldName(NameError),
    /// A field buffer could not be allocated.
    Alloc(AllocError),
    /// The kernel failed.
    Kernel(KernelError),
    /// Communication failed, or a peer aborted the group.
    Comm(CommError),
    /// The run log could not be written.
    Log(io::Error),
}

impl RunError {
    /// Stable numeric code for logs and the group abort.
    ///
    /// | Code | Failure |
    /// |------|---------|
    /// | 1 | configuration |
    /// | 2 | parameters |
    /// | 10 | decomposition |
    /// | 20-24 | store open, list, read, write, close |
    /// | 30 | allocation |
    /// | 40 | kernel |
    /// | 50 | communication |
    /// | 60 | log |
    pub fn code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::Params(_)) => 2,
            Self::Config(_) => 1,
            Self::Decomp(DecompError::Comm(_)) => 50,
            Self::Decomp(_) => 10,
            Self::Store { op, .. } => match op {
                StoreOp::Open => 20,
                StoreOp::List => 21,
                StoreOp::Read => 22,
                StoreOp::Write => 23,
                StoreOp::Close => 24,
            },
            Self::FieldName(_) => 21,
            Self::Alloc(_) => 30,
            Self::Kernel(_) => 40,
            Self::Comm(_) => 50,
            Self::Log(_) => 60,
        }
    }

    /// The rank and code of a peer's abort, if that is what stopped
    /// this rank.
    pub fn aborted_by(&self) -> Option<(usize, i32)> {
        match self {
            Self::Comm(CommError::Aborted { origin, code })
            | Self::Decomp(DecompError::Comm(CommError::Aborted { origin, code })) => {
                Some((*origin, *code))
            }
            _ => None,
        }
    }

    pub(crate) fn store(op: StoreOp, path: &std::path::Path) -> impl FnOnce(StoreError) -> Self {
        let path = path.display().to_string();
        move |source| Self::Store { op, path, source }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Decomp(e) => write!(f, "decomposition: {e}"),
            Self::Store { op, path, source } => write!(f, "store {op} '{path}': {source}"),
            Self::FieldName(e) => write!(f, "field name: {e}"),
            Self::Alloc(e) => write!(f, "allocation: {e}"),
            Self::Kernel(e) => write!(f, "kernel: {e}"),
            Self::Comm(e) => write!(f, "communication: {e}"),
            Self::Log(e) => write!(f, "log: {e}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Decomp(e) => Some(e),
            Self::Store { source, .. } => Some(source),
            Self::FieldName(e) => Some(e),
            Self::Alloc(e) => Some(e),
            Self::Kernel(e) => Some(e),
            Self::Comm(e) => Some(e),
            Self::Log(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DecompError> for RunError {
    fn from(e: DecompError) -> Self {
        Self::Decomp(e)
    }
}

impl From<NameError> for RunError {
    fn from(e: NameError) -> Self {
        Self::FieldName(e)
    }
}

impl From<AllocError> for RunError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<KernelError> for RunError {
    fn from(e: KernelError) -> Self {
        Self::Kernel(e)
    }
}

impl From<CommError> for RunError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::ParamsError;

    #[test]
    fn codes_follow_the_taxonomy() {
        let missing = ParamsError::Missing {
            key: "nsteps".to_string(),
        };
        assert_eq!(RunError::Config(ConfigError::Params(missing)).code(), 2);
        assert_eq!(RunError::Config(ConfigError::NoSteps).code(), 1);
        assert_eq!(RunError::Decomp(DecompError::MissingGlobal).code(), 10);
        assert_eq!(
            RunError::Store {
                op: StoreOp::Write,
                path: "x".to_string(),
                source: StoreError::ReadOnly,
            }
            .code(),
            23
        );
        assert_eq!(RunError::Alloc(AllocError { elements: Some(1) }).code(), 30);
        assert_eq!(
            RunError::Comm(CommError::Disconnected { peer: 1 }).code(),
            50
        );
    }

    #[test]
    fn abort_origin_is_found_through_decomp() {
        let aborted = CommError::Aborted { origin: 2, code: 23 };
        assert_eq!(
            RunError::Decomp(DecompError::Comm(aborted.clone())).aborted_by(),
            Some((2, 23))
        );
        assert_eq!(RunError::Comm(aborted).aborted_by(), Some((2, 23)));
        assert_eq!(RunError::Config(ConfigError::NoSteps).aborted_by(), None);
    }

    #[test]
    fn store_errors_name_operation_and_path() {
        let err = RunError::store(StoreOp::Open, std::path::Path::new("init.chk"))(
            StoreError::InvalidMagic,
        );
        let text = err.to_string();
        assert!(text.starts_with("store open 'init.chk'"), "{text}");
        assert_eq!(err.code(), 20);
    }
}
