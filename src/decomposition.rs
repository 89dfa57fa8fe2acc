//! Decomposition of a global grid over ranks and per-rank worker grids.
//!
//! [`Decomposition`] is created collectively on every rank and afterwards
//! answers two questions from local state:
//!
//! - which sub-domain does local worker `id` own ([`Decomposition::domain`]),
//! - which worker, possibly on another rank, owns the sub-domain next to it in
//!   a given direction ([`Decomposition::neighbor`]). Every axis is periodic.
//!
//! Creation goes through one of two topology strategies (hierarchical levels
//! or a flat Cartesian grid). The communicator the strategy creates is owned by
//! the decomposition and released exactly once, by
//! [`finalize`](Decomposition::finalize) or on drop.
//!
//! ```
//! use grid_decomp::prelude::*;
//!
//! let d = Decomposition::flat(
//!     &NoComm,
//!     Dims3::unit(),
//!     Dims3::new(2, 1, 1),
//!     [10, 4, 4],
//!     false,
//! )
//! .unwrap();
//! assert_eq!(d.domain(1).offset, [5, 0, 0]);
//! assert_eq!(d.neighbor(1, 1, 0, 0).thread_id, 0);
//! ```

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::algs::communicator::{Communicator, LocalComm, NoComm};
use crate::config::{DecompositionConfig, TopologyConfig};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::decomp_error::DecompError;
use crate::partitioning::{AxisPartition, check_extents, global_extents, partition_axes};
use crate::topology::cartesian::FlatCartesian;
use crate::topology::coords::{Dims3, Direction, GlobalCoord, NDIMS, ProcCoord};
use crate::topology::hierarchical::{HierarchicalTopology, Level, hierarchy_dims};
use crate::topology::mapping;
use crate::topology::order::AxisOrder;
use crate::topology::strategy::{Topology, TopologyStrategy};

/// The sub-domain owned by one logical worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    /// Linear index of `coord` in the combined torus, x fastest.
    pub id: usize,
    /// Rank owning the worker.
    pub rank: usize,
    /// Worker index within its rank.
    pub thread_id: usize,
    /// Position in the combined torus.
    pub coord: GlobalCoord,
    /// First cell of the sub-domain, per axis.
    pub offset: [usize; NDIMS],
    /// Number of cells of the sub-domain, per axis.
    pub extent: [usize; NDIMS],
}

/// Per-rank view of a decomposed grid.
#[derive(Debug)]
pub struct Decomposition<C: Communicator> {
    topology: Topology<C>,
    rank: usize,
    size: usize,
    procs: Dims3,
    threads: Dims3,
    my_coord: ProcCoord,
    origin: GlobalCoord,
    last: GlobalCoord,
    axes: [AxisPartition; NDIMS],
}

assert_impl_all!(Domain: Send, Sync, Copy);
assert_impl_all!(Decomposition<NoComm>: Send, Sync);
assert_impl_all!(Decomposition<LocalComm>: Send, Sync);

impl<C: Communicator> Decomposition<C> {
    /// Collective: decompose over a hierarchical process grid.
    ///
    /// `levels` are listed innermost first; `extents` is the whole grid, or one
    /// worker's sub-domain when `extents_are_local` is set.
    pub fn hierarchical(
        world: &C,
        order: AxisOrder,
        threads: Dims3,
        levels: Vec<Level>,
        extents: [usize; NDIMS],
        extents_are_local: bool,
    ) -> Result<Self, DecompError> {
        let procs = hierarchy_dims(&levels)?;
        let global = Self::check_local(procs, threads, extents, extents_are_local)?;
        let topology = HierarchicalTopology::create(world, order, levels)?;
        Self::build(topology.into(), threads, global)
    }

    /// Collective: decompose over a flat periodic Cartesian process grid.
    pub fn flat(
        world: &C,
        procs: Dims3,
        threads: Dims3,
        extents: [usize; NDIMS],
        extents_are_local: bool,
    ) -> Result<Self, DecompError> {
        procs.validate("process grid")?;
        let global = Self::check_local(procs, threads, extents, extents_are_local)?;
        let topology = FlatCartesian::create(world, procs)?;
        Self::build(topology.into(), threads, global)
    }

    /// Collective: decompose as described by `cfg`.
    pub fn from_config(world: &C, cfg: &DecompositionConfig) -> Result<Self, DecompError> {
        match &cfg.topology {
            TopologyConfig::Hierarchical { order, levels } => Self::hierarchical(
                world,
                *order,
                cfg.thread_grid,
                levels.clone(),
                cfg.extents,
                cfg.extents_are_local,
            ),
            TopologyConfig::Flat { process_grid } => Self::flat(
                world,
                *process_grid,
                cfg.thread_grid,
                cfg.extents,
                cfg.extents_are_local,
            ),
        }
    }

    /// Checks that need no communication; returns the global extents.
    fn check_local(
        procs: Dims3,
        threads: Dims3,
        extents: [usize; NDIMS],
        extents_are_local: bool,
    ) -> Result<[usize; NDIMS], DecompError> {
        threads.validate("thread grid")?;
        let lines = procs.try_scaled(threads, "line grid")?;
        let global = global_extents(extents, lines, extents_are_local)?;
        check_extents(global, lines)?;
        Ok(global)
    }

    fn build(
        topology: Topology<C>,
        threads: Dims3,
        global: [usize; NDIMS],
    ) -> Result<Self, DecompError> {
        let procs = topology.process_grid();
        let lines = procs.scaled(threads);
        // on error `topology` drops and releases its communicator
        let axes = partition_axes(global, lines)?;
        let my_coord = topology.my_coord();
        let d = Self {
            rank: topology.rank(),
            size: topology.size(),
            procs,
            threads,
            my_coord,
            origin: mapping::combine(my_coord, Default::default(), threads),
            last: GlobalCoord(std::array::from_fn(|a| lines[a] - 1)),
            axes,
            topology,
        };
        crate::debug_invariants!(d.validate_invariants(), "Decomposition::build");
        log::info!(
            "[rank {}] decomposed {:?} over {} ranks x {} threads, rank coordinate {:?}",
            d.rank,
            global,
            procs,
            threads,
            my_coord
        );
        Ok(d)
    }

    /// This rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn threads_per_rank(&self) -> usize {
        self.threads.volume()
    }

    pub fn process_grid(&self) -> Dims3 {
        self.procs
    }

    pub fn thread_grid(&self) -> Dims3 {
        self.threads
    }

    /// This rank's position in the process grid.
    pub fn my_coord(&self) -> ProcCoord {
        self.my_coord
    }

    /// Largest coordinate of the combined torus on each axis.
    pub fn last_coord(&self) -> GlobalCoord {
        self.last
    }

    /// Cells of the whole grid per axis.
    pub fn global_extent(&self) -> [usize; NDIMS] {
        std::array::from_fn(|a| self.axes[a].global_extent())
    }

    /// Partition table of one axis.
    pub fn axis(&self, axis: usize) -> &AxisPartition {
        &self.axes[axis]
    }

    pub fn topology(&self) -> &Topology<C> {
        &self.topology
    }

    /// Position of local worker `thread_id` in the combined torus.
    pub fn coordinate(&self, thread_id: usize) -> GlobalCoord {
        let t = mapping::thread_coord(thread_id, self.threads);
        GlobalCoord(std::array::from_fn(|a| self.origin[a] + t[a]))
    }

    /// Sub-domain of local worker `thread_id`.
    pub fn domain(&self, thread_id: usize) -> Domain {
        self.describe(self.coordinate(thread_id), self.rank, thread_id)
    }

    /// Like [`domain`](Self::domain), rejecting ids this rank does not own.
    pub fn try_domain(&self, thread_id: usize) -> Result<Domain, DecompError> {
        self.check_id(thread_id)?;
        Ok(self.domain(thread_id))
    }

    /// Sub-domain adjacent to local worker `thread_id` in direction `(dx, dy, dz)`.
    ///
    /// Offsets wrap around periodically; each may span at most one period.
    pub fn neighbor(&self, thread_id: usize, dx: isize, dy: isize, dz: isize) -> Domain {
        self.neighbor_in(thread_id, Direction::new(dx, dy, dz))
    }

    /// [`neighbor`](Self::neighbor) taking a [`Direction`].
    pub fn neighbor_in(&self, thread_id: usize, dir: Direction) -> Domain {
        let coord = mapping::wrap(self.coordinate(thread_id), dir, self.last);
        let (proc, thread) = mapping::split(coord, self.threads);
        let rank = if proc == self.my_coord {
            self.rank
        } else {
            self.topology.resolve(proc)
        };
        self.describe(coord, rank, mapping::thread_id(thread, self.threads))
    }

    /// Like [`neighbor_in`](Self::neighbor_in), rejecting ids this rank does not own.
    pub fn try_neighbor(&self, thread_id: usize, dir: Direction) -> Result<Domain, DecompError> {
        self.check_id(thread_id)?;
        Ok(self.neighbor_in(thread_id, dir))
    }

    /// Sub-domains of all local workers, by ascending thread id.
    pub fn domains(&self) -> Vec<Domain> {
        (0..self.threads_per_rank()).map(|t| self.domain(t)).collect()
    }

    /// Rank map of a hierarchical process grid; `None` for flat grids.
    pub fn render_topology(&self) -> Option<String> {
        self.topology.render()
    }

    /// Print the process topology on rank 0.
    pub fn print(&self) {
        if self.rank != 0 {
            return;
        }
        match self.render_topology() {
            Some(text) => print!("{text}"),
            None => println!("cannot print topology for a flat Cartesian grid"),
        }
    }

    /// Release the communicator now instead of on drop.
    pub fn finalize(mut self) -> Result<(), DecompError> {
        self.topology.release()
    }

    fn check_id(&self, thread_id: usize) -> Result<(), DecompError> {
        if thread_id >= self.threads_per_rank() {
            return Err(DecompError::ThreadIdOutOfRange {
                id: thread_id,
                threads: self.threads_per_rank(),
            });
        }
        Ok(())
    }

    fn describe(&self, coord: GlobalCoord, rank: usize, thread_id: usize) -> Domain {
        Domain {
            id: mapping::global_id(coord, self.procs, self.threads),
            rank,
            thread_id,
            coord,
            offset: std::array::from_fn(|a| self.axes[a].offset(coord[a])),
            extent: std::array::from_fn(|a| self.axes[a].extent(coord[a])),
        }
    }
}

impl<C: Communicator> DebugInvariants for Decomposition<C> {
    fn validate_invariants(&self) -> Result<(), DecompError> {
        ensure(self.my_coord.within(self.procs), || {
            format!("rank coordinate {:?} outside {}", self.my_coord, self.procs)
        })?;
        let owner = self.topology.resolve(self.my_coord);
        ensure(owner == self.rank, || {
            format!("rank {} resolves its own coordinate to rank {owner}", self.rank)
        })?;
        let lines = self.procs.scaled(self.threads);
        for (a, axis) in self.axes.iter().enumerate() {
            ensure(axis.lines() == lines[a], || {
                format!("axis {a} has {} lines, grid has {}", axis.lines(), lines[a])
            })?;
            axis.validate_invariants()?;
        }
        Ok(())
    }
}
