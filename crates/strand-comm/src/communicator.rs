//! The [`Communicator`] trait and message tags.

use crate::error::CommError;

/// Message tag used to match sends with receives.
pub type Tag = u32;

/// Rank of the coordinating process.
///
/// The coordinator alone holds full-domain buffers and performs store
/// I/O.
pub const COORDINATOR: usize = 0;

/// Tags reserved by the Strand collectives.
///
/// Halo exchange uses `HALO_BASE + 2 * axis + direction`, so tags at or
/// above [`HALO_BASE`](tags::HALO_BASE) are taken.
pub mod tags {
    use super::Tag;

    /// Byte broadcast from a root rank.
    pub const BROADCAST: Tag = 1;
    /// Barrier arrival and release.
    pub const BARRIER: Tag = 2;
    /// Ordered hand-off token.
    pub const HANDOFF: Tag = 3;
    /// Coordinator-to-rank subdomain transfer.
    pub const SCATTER: Tag = 10;
    /// Rank-to-coordinator subdomain transfer.
    pub const GATHER: Tag = 11;
    /// First halo-exchange tag.
    pub const HALO_BASE: Tag = 100;
}

/// A member's view of a fixed process group.
///
/// Ranks are `0..size()`. Receives block until a message with the
/// requested source and tag arrives, or until the group is aborted.
/// Messages between one pair of ranks with the same tag are delivered
/// in the order they were sent.
pub trait Communicator {
    /// This process's rank.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Whether this process is the [`COORDINATOR`].
    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    /// Send `data` to `dest` under `tag`.
    fn send(&self, dest: usize, tag: Tag, data: &[f64]) -> Result<(), CommError>;

    /// Receive a message from `src` under `tag` into `buf`.
    ///
    /// The message length must equal `buf.len()`.
    fn recv(&self, src: usize, tag: Tag, buf: &mut [f64]) -> Result<(), CommError>;

    /// Send to `dest` and receive from `src` as one paired exchange.
    ///
    /// The default sends first and then receives, which is only
    /// deadlock-free when [`send`](Communicator::send) does not block.
    /// Backends with blocking sends must override it.
    #[allow(clippy::too_many_arguments)]
    fn sendrecv(
        &self,
        dest: usize,
        send_tag: Tag,
        data: &[f64],
        src: usize,
        recv_tag: Tag,
        buf: &mut [f64],
    ) -> Result<(), CommError> {
        self.send(dest, send_tag, data)?;
        self.recv(src, recv_tag, buf)
    }

    /// Broadcast `bytes` from `root` to every rank.
    ///
    /// On non-root ranks the previous contents are replaced.
    fn broadcast_bytes(&self, root: usize, bytes: &mut Vec<u8>) -> Result<(), CommError>;

    /// Block until every rank has reached the barrier.
    fn barrier(&self) -> Result<(), CommError>;

    /// Signal every rank that the run is over.
    ///
    /// Blocking operations on other ranks fail with
    /// [`CommError::Aborted`]. Backends may terminate the process
    /// instead of returning.
    fn abort(&self, code: i32);
}
