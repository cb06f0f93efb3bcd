//! In-process thread-group backend.
//!
//! [`LocalGroup`] runs one OS thread per rank. Each rank owns a
//! [`LocalComm`] with an unbounded crossbeam inbox and a sender to every
//! peer's inbox, so sends never block. Messages that arrive before they
//! are asked for wait in a per-rank pending queue and are matched FIFO
//! by `(source, tag)`, like an MPI unexpected-message queue.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::communicator::{tags, Communicator, Tag};
use crate::error::CommError;

/// Abort code used when a rank thread panics.
pub const PANIC_ABORT_CODE: i32 = -1;

/// Abort code used when a rank thread cannot be started.
pub const SPAWN_ABORT_CODE: i32 = -2;

enum Payload {
    Values(Vec<f64>),
    Bytes(Vec<u8>),
    Abort { code: i32 },
}

struct Envelope {
    src: usize,
    tag: Tag,
    payload: Payload,
}

/// Aborts a local group on behalf of one rank.
///
/// Cloneable and usable from any thread, including threads outside
/// the group.
#[derive(Clone)]
pub struct AbortHandle {
    origin: usize,
    peers: Arc<[Sender<Envelope>]>,
}

impl AbortHandle {
    /// Deliver an abort with `code` to every rank except the origin.
    pub fn abort(&self, code: i32) {
        for (rank, tx) in self.peers.iter().enumerate() {
            if rank == self.origin {
                continue;
            }
            // A rank that already finished has dropped its inbox.
            let _ = tx.send(Envelope {
                src: self.origin,
                tag: 0,
                payload: Payload::Abort { code },
            });
        }
    }
}

impl std::fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortHandle")
            .field("origin", &self.origin)
            .field("size", &self.peers.len())
            .finish()
    }
}

/// One rank's endpoint in a [`LocalGroup`].
///
/// `LocalComm` is [`Send`] so it can be moved into its rank thread,
/// but not [`Sync`]: a rank is driven by exactly one thread.
pub struct LocalComm {
    rank: usize,
    peers: Arc<[Sender<Envelope>]>,
    inbox: Receiver<Envelope>,
    pending: RefCell<VecDeque<Envelope>>,
    aborted: Cell<Option<(usize, i32)>>,
}

impl LocalComm {
    /// A handle that aborts the group on behalf of this rank.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            origin: self.rank,
            peers: Arc::clone(&self.peers),
        }
    }

    /// Origin and code of the abort this rank has observed, if any.
    pub fn abort_status(&self) -> Option<(usize, i32)> {
        self.aborted.get()
    }

    fn check_rank(&self, rank: usize) -> Result<(), CommError> {
        if rank < self.peers.len() {
            Ok(())
        } else {
            Err(CommError::InvalidRank {
                rank,
                size: self.peers.len(),
            })
        }
    }

    fn aborted_error(&self) -> Result<(), CommError> {
        match self.aborted.get() {
            Some((origin, code)) => Err(CommError::Aborted { origin, code }),
            None => Ok(()),
        }
    }

    fn mark_aborted(&self, origin: usize, code: i32) -> CommError {
        self.aborted.set(Some((origin, code)));
        CommError::Aborted { origin, code }
    }

    /// Move everything already delivered into the pending queue,
    /// noticing an abort without blocking.
    fn poll_abort(&self) -> Result<(), CommError> {
        self.aborted_error()?;
        loop {
            match self.inbox.try_recv() {
                Ok(Envelope {
                    src,
                    payload: Payload::Abort { code },
                    ..
                }) => return Err(self.mark_aborted(src, code)),
                Ok(env) => self.pending.borrow_mut().push_back(env),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }

    fn take(&self, src: usize, tag: Tag) -> Result<Payload, CommError> {
        self.aborted_error()?;
        {
            let mut pending = self.pending.borrow_mut();
            if let Some(pos) = pending.iter().position(|e| e.src == src && e.tag == tag) {
                if let Some(env) = pending.remove(pos) {
                    return Ok(env.payload);
                }
            }
        }
        loop {
            let env = self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { peer: src })?;
            match env.payload {
                Payload::Abort { code } => return Err(self.mark_aborted(env.src, code)),
                _ if env.src == src && env.tag == tag => return Ok(env.payload),
                _ => self.pending.borrow_mut().push_back(env),
            }
        }
    }

    fn post(&self, dest: usize, tag: Tag, payload: Payload) -> Result<(), CommError> {
        self.peers[dest]
            .send(Envelope {
                src: self.rank,
                tag,
                payload,
            })
            .map_err(|_| CommError::Disconnected { peer: dest })
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, dest: usize, tag: Tag, data: &[f64]) -> Result<(), CommError> {
        self.check_rank(dest)?;
        self.poll_abort()?;
        self.post(dest, tag, Payload::Values(data.to_vec()))
    }

    fn recv(&self, src: usize, tag: Tag, buf: &mut [f64]) -> Result<(), CommError> {
        self.check_rank(src)?;
        match self.take(src, tag)? {
            Payload::Values(values) => {
                if values.len() != buf.len() {
                    return Err(CommError::LengthMismatch {
                        peer: src,
                        tag,
                        expected: buf.len(),
                        found: values.len(),
                    });
                }
                buf.copy_from_slice(&values);
                Ok(())
            }
            _ => Err(CommError::UnexpectedPayload { peer: src, tag }),
        }
    }

    fn broadcast_bytes(&self, root: usize, bytes: &mut Vec<u8>) -> Result<(), CommError> {
        self.check_rank(root)?;
        if self.rank == root {
            self.poll_abort()?;
            for dest in (0..self.size()).filter(|&r| r != root) {
                self.post(dest, tags::BROADCAST, Payload::Bytes(bytes.clone()))?;
            }
            return Ok(());
        }
        match self.take(root, tags::BROADCAST)? {
            Payload::Bytes(received) => {
                *bytes = received;
                Ok(())
            }
            _ => Err(CommError::UnexpectedPayload {
                peer: root,
                tag: tags::BROADCAST,
            }),
        }
    }

    fn barrier(&self) -> Result<(), CommError> {
        if self.size() == 1 {
            return self.poll_abort();
        }
        if self.rank == 0 {
            for src in 1..self.size() {
                self.recv(src, tags::BARRIER, &mut [])?;
            }
            for dest in 1..self.size() {
                self.send(dest, tags::BARRIER, &[])?;
            }
        } else {
            self.send(0, tags::BARRIER, &[])?;
            self.recv(0, tags::BARRIER, &mut [])?;
        }
        Ok(())
    }

    fn abort(&self, code: i32) {
        if self.aborted.get().is_some() {
            return;
        }
        tracing::warn!(rank = self.rank, code, "aborting process group");
        self.aborted.set(Some((self.rank, code)));
        self.abort_handle().abort(code);
    }
}

impl Drop for LocalComm {
    fn drop(&mut self) {
        if thread::panicking() {
            self.abort(PANIC_ABORT_CODE);
        }
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.peers.len())
            .field("aborted", &self.aborted.get())
            .finish()
    }
}

/// Factory and runner for in-process groups.
#[derive(Debug)]
pub struct LocalGroup;

impl LocalGroup {
    /// Create the endpoints of a group of `size` ranks, in rank order.
    pub fn create(size: usize) -> Vec<LocalComm> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        let peers: Arc<[Sender<Envelope>]> = senders.into();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalComm {
                rank,
                peers: Arc::clone(&peers),
                inbox,
                pending: RefCell::new(VecDeque::new()),
                aborted: Cell::new(None),
            })
            .collect()
    }

    /// Run `f` once per rank, each on its own named thread, and collect
    /// the results in rank order.
    ///
    /// If a rank panics, its endpoint aborts the group and the panic is
    /// re-raised here once every rank has finished. If a thread cannot
    /// be started, the ranks already running are aborted and
    /// [`CommError::SpawnFailed`] is returned.
    pub fn run<T, F>(size: usize, f: F) -> Result<Vec<T>, CommError>
    where
        F: Fn(LocalComm) -> T + Sync,
        T: Send,
    {
        let comms = Self::create(size);
        let peers = comms.first().map(|c| Arc::clone(&c.peers));
        let f = &f;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(size);
            let mut spawn_error = None;
            for comm in comms {
                let rank = comm.rank;
                let spawned = thread::Builder::new()
                    .name(format!("strand-rank-{rank}"))
                    .spawn_scoped(scope, move || f(comm));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        if let Some(peers) = &peers {
                            AbortHandle {
                                origin: rank,
                                peers: Arc::clone(peers),
                            }
                            .abort(SPAWN_ABORT_CODE);
                        }
                        spawn_error = Some(CommError::SpawnFailed {
                            rank,
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }

            let mut results = Vec::with_capacity(handles.len());
            let mut panic = None;
            for handle in handles {
                match handle.join() {
                    Ok(value) => results.push(value),
                    Err(payload) => {
                        panic.get_or_insert(payload);
                    }
                }
            }
            if let Some(payload) = panic {
                std::panic::resume_unwind(payload);
            }
            match spawn_error {
                Some(e) => Err(e),
                None => Ok(results),
            }
        })
    }
}
