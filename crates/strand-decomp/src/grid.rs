//! The decomposition of one run: setup plus scatter, gather, and share.

use smallvec::SmallVec;
use strand_comm::{tags, Communicator, Tag, COORDINATOR};
use strand_core::{GridDims, MAX_DIMS};
use tracing::{debug, trace};

use crate::boundary::BoundaryPolicy;
use crate::error::DecompError;
use crate::layout::{fill_region, pack_region, unpack_region, LocalLayout, Region};
use crate::partition::{partition, Subdomain};
use crate::topology::{create_process_grid, ProcessTopology, Side};

/// Inputs to [`DecompGrid::setup`].
#[derive(Clone, Debug, PartialEq)]
pub struct DecompConfig {
    /// Global grid extents.
    pub global: GridDims,
    /// Requested process grid; empty or one entry per axis, `0` = free.
    pub requested: SmallVec<[usize; MAX_DIMS]>,
    /// Configured field dimensionality.
    pub ndim: usize,
    /// Ghost width on every face of every active axis.
    pub ghost_width: usize,
    /// Ghost values at domain edges.
    pub boundary: BoundaryPolicy,
}

impl DecompConfig {
    /// Free process grid, periodic boundary, dimensionality taken from
    /// `global`.
    pub fn new(global: GridDims, ghost_width: usize) -> Self {
        Self {
            global,
            requested: SmallVec::new(),
            ndim: global.ndim(),
            ghost_width,
            boundary: BoundaryPolicy::default(),
        }
    }

    /// Request a process grid shape.
    pub fn with_process_grid(mut self, requested: &[usize]) -> Self {
        self.requested = SmallVec::from_slice(requested);
        self
    }

    /// Set the boundary policy.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }
}

/// A fixed assignment of the global grid to the ranks of a group.
///
/// Built once by [`setup`](Self::setup); every rank computes the same
/// decomposition without communicating. [`scatter`](Self::scatter),
/// [`gather`](Self::gather), and [`share`](Self::share) are collective:
/// every rank must call them in the same order with buffers of the
/// lengths this decomposition prescribes.
#[derive(Clone, Debug)]
pub struct DecompGrid {
    global: GridDims,
    topology: ProcessTopology,
    subdomains: Vec<Subdomain>,
    layout: LocalLayout,
    boundary: BoundaryPolicy,
}

impl DecompGrid {
    /// Compute the process grid and this rank's subdomain.
    ///
    /// Fails identically on every rank when the configuration cannot be
    /// decomposed, so callers abort the group on error.
    pub fn setup<C>(comm: &C, config: &DecompConfig) -> Result<Self, DecompError>
    where
        C: Communicator + ?Sized,
    {
        if config.global.ndim() != config.ndim {
            return Err(DecompError::DimensionalityMismatch {
                grid: config.global.ndim(),
                field: config.ndim,
            });
        }
        let grid = create_process_grid(comm.size(), config.ndim, &config.requested)?;
        let subdomains = partition(&config.global, &grid)?;

        let ghost = config.ghost_width;
        if ghost > 0 {
            for axis in 0..config.ndim {
                let thinnest = subdomains
                    .iter()
                    .map(|s| s.dims().axis(axis))
                    .min()
                    .unwrap_or(0);
                if thinnest < ghost {
                    return Err(DecompError::SubdomainThinnerThanHalo {
                        axis,
                        local: thinnest,
                        ghost,
                    });
                }
            }
        }

        let topology = ProcessTopology::new(grid, comm.rank());
        let layout = LocalLayout::new(*subdomains[comm.rank()].dims(), ghost);
        let coords = topology.coords();
        debug!(
            rank = comm.rank(),
            process_grid = %grid,
            coords = ?&coords[..config.ndim],
            local = %layout.interior(),
            "decomposition ready"
        );
        Ok(Self {
            global: config.global,
            topology,
            subdomains,
            layout,
            boundary: config.boundary,
        })
    }

    /// Global grid extents.
    pub fn global_dims(&self) -> &GridDims {
        &self.global
    }

    /// Process grid.
    pub fn process_grid(&self) -> &GridDims {
        self.topology.grid()
    }

    /// This rank's place in the process grid.
    pub fn topology(&self) -> &ProcessTopology {
        &self.topology
    }

    /// This rank's local buffer layout.
    pub fn layout(&self) -> &LocalLayout {
        &self.layout
    }

    /// This rank's interior extents.
    pub fn local_dims(&self) -> &GridDims {
        self.layout.interior()
    }

    /// This rank's subdomain.
    pub fn subdomain(&self) -> &Subdomain {
        &self.subdomains[self.topology.rank()]
    }

    /// Subdomains of every rank, in rank order.
    pub fn subdomains(&self) -> &[Subdomain] {
        &self.subdomains
    }

    /// Boundary policy at domain edges.
    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Length of a local buffer.
    pub fn local_len(&self) -> usize {
        self.layout.padded_volume()
    }

    /// Length of a global buffer.
    pub fn global_len(&self) -> usize {
        self.global.volume()
    }

    /// Distribute a global array from the coordinator.
    ///
    /// Every rank receives its subdomain's cells into the interior of
    /// `local`; ghost cells are not touched. `global` is read on the
    /// coordinator only.
    pub fn scatter<C>(
        &self,
        comm: &C,
        global: Option<&[f64]>,
        local: &mut [f64],
    ) -> Result<(), DecompError>
    where
        C: Communicator + ?Sized,
    {
        self.check_local(local.len())?;
        if comm.is_coordinator() {
            let global = global.ok_or(DecompError::MissingGlobal)?;
            self.check_global(global.len())?;
            let shape = self.global.padded();
            let mut packed = Vec::new();
            for (rank, sub) in self.subdomains.iter().enumerate() {
                packed.clear();
                pack_region(shape, global, &global_region(sub), &mut packed);
                if rank == comm.rank() {
                    self.layout.unpack_interior(local, &packed);
                } else {
                    trace!(dest = rank, values = packed.len(), "scatter");
                    comm.send(rank, tags::SCATTER, &packed)?;
                }
            }
        } else {
            let mut packed = vec![0.0; self.subdomain().volume()];
            comm.recv(COORDINATOR, tags::SCATTER, &mut packed)?;
            self.layout.unpack_interior(local, &packed);
        }
        Ok(())
    }

    /// Collect every rank's interior into a global array on the
    /// coordinator.
    ///
    /// `global` is written on the coordinator only.
    pub fn gather<C>(
        &self,
        comm: &C,
        global: Option<&mut [f64]>,
        local: &[f64],
    ) -> Result<(), DecompError>
    where
        C: Communicator + ?Sized,
    {
        self.check_local(local.len())?;
        let mut packed = Vec::with_capacity(self.subdomain().volume());
        if comm.is_coordinator() {
            let global = global.ok_or(DecompError::MissingGlobal)?;
            self.check_global(global.len())?;
            let shape = self.global.padded();
            for (rank, sub) in self.subdomains.iter().enumerate() {
                packed.clear();
                if rank == comm.rank() {
                    self.layout.pack_interior(local, &mut packed);
                } else {
                    packed.resize(sub.volume(), 0.0);
                    comm.recv(rank, tags::GATHER, &mut packed)?;
                    trace!(src = rank, values = packed.len(), "gather");
                }
                unpack_region(shape, global, &global_region(sub), &packed);
            }
        } else {
            self.layout.pack_interior(local, &mut packed);
            comm.send(COORDINATOR, tags::GATHER, &packed)?;
        }
        Ok(())
    }

    /// Refresh the ghost cells of `local` from neighboring subdomains.
    ///
    /// Axes are exchanged in order, each slab spanning the full padded
    /// extent of the other axes, so edge and corner ghosts are correct
    /// once the last axis is done. Ghosts facing the domain edge follow
    /// the [`BoundaryPolicy`].
    pub fn share<C>(&self, comm: &C, local: &mut [f64]) -> Result<(), DecompError>
    where
        C: Communicator + ?Sized,
    {
        self.check_local(local.len())?;
        if self.layout.ghost() == 0 {
            return Ok(());
        }
        let mut scratch = Scratch::default();
        for axis in 0..self.layout.ndim() {
            self.exchange_axis(comm, axis, local, &mut scratch)?;
        }
        Ok(())
    }

    fn exchange_axis<C>(
        &self,
        comm: &C,
        axis: usize,
        local: &mut [f64],
        scratch: &mut Scratch,
    ) -> Result<(), DecompError>
    where
        C: Communicator + ?Sized,
    {
        let g = self.layout.ghost();
        let n = self.layout.interior().axis(axis);
        let full = self.layout.padded_region();
        let periodic = self.boundary.is_periodic();
        let low = self.topology.neighbor(axis, Side::Low, periodic);
        let high = self.topology.neighbor(axis, Side::High, periodic);

        // First interior layers travel down into the low neighbor's high ghosts.
        self.transfer(
            comm,
            local,
            Slab {
                region: full.with_axis(axis, g, 2 * g),
                peer: low,
            },
            Slab {
                region: full.with_axis(axis, n + g, n + 2 * g),
                peer: high,
            },
            halo_tag(axis, Side::Low),
            scratch,
        )?;
        // Last interior layers travel up into the high neighbor's low ghosts.
        self.transfer(
            comm,
            local,
            Slab {
                region: full.with_axis(axis, n, n + g),
                peer: high,
            },
            Slab {
                region: full.with_axis(axis, 0, g),
                peer: low,
            },
            halo_tag(axis, Side::High),
            scratch,
        )?;

        if low.is_none() {
            self.fill_edge(local, axis, Side::Low, scratch);
        }
        if high.is_none() {
            self.fill_edge(local, axis, Side::High, scratch);
        }
        Ok(())
    }

    fn transfer<C>(
        &self,
        comm: &C,
        local: &mut [f64],
        outgoing: Slab,
        incoming: Slab,
        tag: Tag,
        scratch: &mut Scratch,
    ) -> Result<(), DecompError>
    where
        C: Communicator + ?Sized,
    {
        let shape = self.layout.padded_shape();
        let me = self.topology.rank();
        scratch.send.clear();
        if outgoing.peer.is_some() {
            pack_region(shape, local, &outgoing.region, &mut scratch.send);
        }
        scratch.recv.clear();
        scratch.recv.resize(incoming.region.volume(), 0.0);

        match (outgoing.peer, incoming.peer) {
            (Some(dest), Some(src)) if dest == me && src == me => {
                unpack_region(shape, local, &incoming.region, &scratch.send);
                return Ok(());
            }
            (Some(dest), Some(src)) => {
                comm.sendrecv(dest, tag, &scratch.send, src, tag, &mut scratch.recv)?
            }
            (Some(dest), None) => comm.send(dest, tag, &scratch.send)?,
            (None, Some(src)) => comm.recv(src, tag, &mut scratch.recv)?,
            (None, None) => return Ok(()),
        }
        if incoming.peer.is_some() {
            unpack_region(shape, local, &incoming.region, &scratch.recv);
        }
        Ok(())
    }

    fn fill_edge(&self, local: &mut [f64], axis: usize, side: Side, scratch: &mut Scratch) {
        let g = self.layout.ghost();
        let n = self.layout.interior().axis(axis);
        let shape = self.layout.padded_shape();
        let full = self.layout.padded_region();
        match self.boundary {
            BoundaryPolicy::Periodic => {}
            BoundaryPolicy::Fixed(value) => {
                let ghosts = match side {
                    Side::Low => full.with_axis(axis, 0, g),
                    Side::High => full.with_axis(axis, n + g, n + 2 * g),
                };
                fill_region(shape, local, &ghosts, value);
            }
            BoundaryPolicy::Reflect => {
                for k in 0..g {
                    let (src, dst) = match side {
                        Side::Low => (g + k, g - 1 - k),
                        Side::High => (n + g - 1 - k, n + g + k),
                    };
                    scratch.send.clear();
                    pack_region(
                        shape,
                        local,
                        &full.with_axis(axis, src, src + 1),
                        &mut scratch.send,
                    );
                    unpack_region(
                        shape,
                        local,
                        &full.with_axis(axis, dst, dst + 1),
                        &scratch.send,
                    );
                }
            }
        }
    }

    fn check_local(&self, len: usize) -> Result<(), DecompError> {
        let expected = self.local_len();
        if len == expected {
            Ok(())
        } else {
            Err(DecompError::BufferSize {
                what: "local",
                expected,
                found: len,
            })
        }
    }

    fn check_global(&self, len: usize) -> Result<(), DecompError> {
        let expected = self.global_len();
        if len == expected {
            Ok(())
        } else {
            Err(DecompError::BufferSize {
                what: "global",
                expected,
                found: len,
            })
        }
    }
}

/// Ghost slab and the rank on the other side of it.
struct Slab {
    region: Region,
    peer: Option<usize>,
}

#[derive(Default)]
struct Scratch {
    send: Vec<f64>,
    recv: Vec<f64>,
}

/// Tag for halo traffic along `axis` moving toward `side`.
fn halo_tag(axis: usize, side: Side) -> Tag {
    tags::HALO_BASE + (2 * axis + side.index()) as Tag
}

fn global_region(sub: &Subdomain) -> Region {
    Region::at(sub.offset(), sub.dims().padded())
}
