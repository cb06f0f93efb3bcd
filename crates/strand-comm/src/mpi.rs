//! MPI backend.
//!
//! One [`MpiComm`] per MPI process. Sends block, so [`sendrecv`]
//! is overridden with the paired MPI call, and [`abort`] ends every
//! process of the job through `MPI_Abort`.
//!
//! [`sendrecv`]: Communicator::sendrecv
//! [`abort`]: Communicator::abort

use mpi::environment::Universe;
use mpi::point_to_point::send_receive_into_with_tags;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::communicator::{Communicator, Tag};
use crate::error::CommError;

/// A rank of the MPI world communicator.
pub struct MpiComm {
    world: SimpleCommunicator,
    // Dropped last; finalizes MPI.
    _universe: Universe,
}

impl MpiComm {
    /// Initialize MPI and wrap the world communicator.
    ///
    /// Returns `None` if MPI was already initialized in this process.
    pub fn init() -> Option<Self> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        Some(Self {
            world,
            _universe: universe,
        })
    }

    fn peer(&self, rank: usize) -> Result<i32, CommError> {
        if rank < self.size() {
            i32::try_from(rank).map_err(|_| CommError::InvalidRank {
                rank,
                size: self.size(),
            })
        } else {
            Err(CommError::InvalidRank {
                rank,
                size: self.size(),
            })
        }
    }

    fn check_count(
        &self,
        src: usize,
        tag: Tag,
        status: mpi::point_to_point::Status,
        expected: usize,
    ) -> Result<(), CommError> {
        let found = status.count(f64::equivalent_datatype());
        if usize::try_from(found).ok() == Some(expected) {
            Ok(())
        } else {
            Err(CommError::LengthMismatch {
                peer: src,
                tag,
                expected,
                found: usize::try_from(found).unwrap_or(0),
            })
        }
    }
}

fn mpi_tag(tag: Tag) -> i32 {
    // Strand tags are small; MPI guarantees at least 32767.
    tag as i32
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, dest: usize, tag: Tag, data: &[f64]) -> Result<(), CommError> {
        let dest = self.peer(dest)?;
        self.world
            .process_at_rank(dest)
            .send_with_tag(data, mpi_tag(tag));
        Ok(())
    }

    fn recv(&self, src: usize, tag: Tag, buf: &mut [f64]) -> Result<(), CommError> {
        let peer = self.peer(src)?;
        let status = self
            .world
            .process_at_rank(peer)
            .receive_into_with_tag(buf, mpi_tag(tag));
        self.check_count(src, tag, status, buf.len())
    }

    fn sendrecv(
        &self,
        dest: usize,
        send_tag: Tag,
        data: &[f64],
        src: usize,
        recv_tag: Tag,
        buf: &mut [f64],
    ) -> Result<(), CommError> {
        let dest_rank = self.peer(dest)?;
        let src_rank = self.peer(src)?;
        let status = send_receive_into_with_tags(
            data,
            &self.world.process_at_rank(dest_rank),
            mpi_tag(send_tag),
            buf,
            &self.world.process_at_rank(src_rank),
            mpi_tag(recv_tag),
        );
        self.check_count(src, recv_tag, status, buf.len())
    }

    fn broadcast_bytes(&self, root: usize, bytes: &mut Vec<u8>) -> Result<(), CommError> {
        let root_rank = self.peer(root)?;
        let root_process = self.world.process_at_rank(root_rank);
        let mut len = bytes.len() as u64;
        root_process.broadcast_into(&mut len);
        let len = usize::try_from(len).map_err(|_| CommError::Decode {
            reason: format!("broadcast length {len} does not fit in memory"),
        })?;
        bytes.resize(len, 0);
        if len > 0 {
            root_process.broadcast_into(&mut bytes[..]);
        }
        Ok(())
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.world.barrier();
        Ok(())
    }

    fn abort(&self, code: i32) {
        tracing::error!(rank = self.rank(), code, "calling MPI_Abort");
        self.world.abort(code)
    }
}

impl std::fmt::Debug for MpiComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpiComm")
            .field("rank", &self.rank())
            .field("size", &self.size())
            .finish()
    }
}
