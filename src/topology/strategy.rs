//! The contract every process-grid topology fulfils once created.

use super::cartesian::FlatCartesian;
use super::coords::{Dims3, ProcCoord};
use super::hierarchical::HierarchicalTopology;
use crate::algs::communicator::Communicator;
use crate::decomp_error::DecompError;

/// Post-construction surface of a process-grid topology.
///
/// Both strategies satisfy the same invariants: `my_coord()` lies inside
/// `process_grid()`, and `resolve(my_coord()) == rank()`.
pub trait TopologyStrategy {
    /// Ranks per axis of the process grid.
    fn process_grid(&self) -> Dims3;
    /// This rank's position in the process grid.
    fn my_coord(&self) -> ProcCoord;
    /// This rank within the topology's communicator.
    fn rank(&self) -> usize;
    /// Number of ranks in the topology's communicator.
    fn size(&self) -> usize;
    /// Rank owning the process-grid cell `coord` (periodic).
    fn resolve(&self, coord: ProcCoord) -> usize;
    /// Release the communicator. A second call is a `DoubleRelease` error.
    fn release(&mut self) -> Result<(), DecompError>;
}

/// Collective check that every rank passed the same topology description.
///
/// Every rank sees the same gathered vector and therefore fails with the
/// same error.
pub(crate) fn agree_on<C: Communicator>(comm: &C, fingerprint: u64) -> Result<(), DecompError> {
    let all = comm.all_gather_u64(fingerprint)?;
    if let Some(rank) = all.iter().position(|&f| f != all[0]) {
        log::warn!(
            "[rank {}] topology description of rank {rank} differs from rank 0",
            comm.rank()
        );
        return Err(DecompError::TopologyMismatch { rank });
    }
    Ok(())
}

/// Either of the two topology strategies.
#[derive(Debug)]
pub enum Topology<C: Communicator> {
    Hierarchical(HierarchicalTopology<C>),
    Flat(FlatCartesian<C>),
}

impl<C: Communicator> Topology<C> {
    /// Diagnostic rank map; only hierarchical topologies can be rendered.
    pub fn render(&self) -> Option<String> {
        match self {
            Topology::Hierarchical(h) => Some(h.render()),
            Topology::Flat(_) => None,
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Topology::Hierarchical(_))
    }
}

impl<C: Communicator> TopologyStrategy for Topology<C> {
    fn process_grid(&self) -> Dims3 {
        match self {
            Topology::Hierarchical(t) => t.process_grid(),
            Topology::Flat(t) => t.process_grid(),
        }
    }
    fn my_coord(&self) -> ProcCoord {
        match self {
            Topology::Hierarchical(t) => t.my_coord(),
            Topology::Flat(t) => t.my_coord(),
        }
    }
    fn rank(&self) -> usize {
        match self {
            Topology::Hierarchical(t) => t.rank(),
            Topology::Flat(t) => t.rank(),
        }
    }
    fn size(&self) -> usize {
        match self {
            Topology::Hierarchical(t) => t.size(),
            Topology::Flat(t) => t.size(),
        }
    }
    fn resolve(&self, coord: ProcCoord) -> usize {
        match self {
            Topology::Hierarchical(t) => t.resolve(coord),
            Topology::Flat(t) => t.resolve(coord),
        }
    }
    fn release(&mut self) -> Result<(), DecompError> {
        match self {
            Topology::Hierarchical(t) => t.release(),
            Topology::Flat(t) => t.release(),
        }
    }
}

impl<C: Communicator> From<HierarchicalTopology<C>> for Topology<C> {
    fn from(t: HierarchicalTopology<C>) -> Self {
        Topology::Hierarchical(t)
    }
}

impl<C: Communicator> From<FlatCartesian<C>> for Topology<C> {
    fn from(t: FlatCartesian<C>) -> Self {
        Topology::Flat(t)
    }
}
