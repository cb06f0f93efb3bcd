//! Error types for process-group communication.

use std::error::Error;
use std::fmt;

use crate::communicator::Tag;

/// Errors from point-to-point or collective communication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// The group was aborted; no further communication is possible.
    Aborted {
        /// Rank that issued the abort.
        origin: usize,
        /// Code supplied with the abort.
        code: i32,
    },
    /// A peer's endpoint is gone.
    Disconnected {
        /// The unreachable rank.
        peer: usize,
    },
    /// A rank outside `0..size` was addressed.
    InvalidRank {
        /// The rank requested.
        rank: usize,
        /// Group size.
        size: usize,
    },
    /// A received buffer has a different length than the receive buffer.
    LengthMismatch {
        /// Sending rank.
        peer: usize,
        /// Message tag.
        tag: Tag,
        /// Length of the receive buffer.
        expected: usize,
        /// Length of the message.
        found: usize,
    },
    /// A message carried a payload of the wrong kind for its tag.
    UnexpectedPayload {
        /// Sending rank.
        peer: usize,
        /// Message tag.
        tag: Tag,
    },
    /// Broadcast bytes could not be decoded.
    Decode {
        /// What went wrong.
        reason: String,
    },
    /// A rank thread could not be started.
    SpawnFailed {
        /// Rank whose thread failed to start.
        rank: usize,
        /// OS-level reason.
        reason: String,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted { origin, code } => {
                write!(f, "group aborted by rank {origin} with code {code}")
            }
            Self::Disconnected { peer } => write!(f, "rank {peer} disconnected"),
            Self::InvalidRank { rank, size } => {
                write!(f, "rank {rank} outside group of size {size}")
            }
            Self::LengthMismatch {
                peer,
                tag,
                expected,
                found,
            } => write!(
                f,
                "message from rank {peer} (tag {tag}) has {found} values, expected {expected}"
            ),
            Self::UnexpectedPayload { peer, tag } => {
                write!(f, "unexpected payload kind from rank {peer} (tag {tag})")
            }
            Self::Decode { reason } => write!(f, "broadcast decode failed: {reason}"),
            Self::SpawnFailed { rank, reason } => {
                write!(f, "failed to start rank {rank}: {reason}")
            }
        }
    }
}

impl Error for CommError {}
