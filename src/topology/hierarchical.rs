//! Hierarchical process grids.
//!
//! A hierarchical topology describes the process grid as nested levels
//! (cores inside a socket, sockets inside a node, nodes in the machine),
//! each level splitting its parent into a small `x*y*z` block. The process
//! grid is the axis-wise product of all level splits.
//!
//! Ranks are numbered level by level, innermost level fastest, so that ranks
//! sharing an inner level are consecutive. Inside one level the block index
//! runs along the configured [`AxisOrder`].
//!
//! ```text
//! levels: core 2x2x1, node 2x1x1, order xyz      process grid 4x2x1
//!
//!   y=1 |  2  3 |  6  7 |
//!   y=0 |  0  1 |  4  5 |
//!        node 0   node 1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use itertools::Itertools;

use super::coords::{Dims3, ProcCoord};
use super::order::AxisOrder;
use super::strategy::{TopologyStrategy, agree_on};
use crate::algs::communicator::Communicator;
use crate::decomp_error::DecompError;

/// Kind of hardware domain a hierarchy level stands for.
///
/// Only used to label levels; the splits are always taken from configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Node,
    Socket,
    Numa,
    #[serde(alias = "l3cache")]
    L3,
    #[serde(alias = "l2cache")]
    L2,
    #[serde(alias = "l1cache")]
    L1,
    Core,
    #[serde(alias = "pu")]
    HwThread,
}

impl LevelKind {
    pub fn name(&self) -> &'static str {
        match self {
            LevelKind::Node => "node",
            LevelKind::Socket => "socket",
            LevelKind::Numa => "numa",
            LevelKind::L3 => "l3",
            LevelKind::L2 => "l2",
            LevelKind::L1 => "l1",
            LevelKind::Core => "core",
            LevelKind::HwThread => "hwthread",
        }
    }
}

impl FromStr for LevelKind {
    type Err = DecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "node" => LevelKind::Node,
            "socket" => LevelKind::Socket,
            "numa" => LevelKind::Numa,
            "l3" | "l3cache" => LevelKind::L3,
            "l2" | "l2cache" => LevelKind::L2,
            "l1" | "l1cache" => LevelKind::L1,
            "core" => LevelKind::Core,
            "hwthread" | "pu" => LevelKind::HwThread,
            _ => return Err(DecompError::InvalidLevelKind(s.to_string())),
        })
    }
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One level of the hierarchy and how it splits its parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    pub kind: LevelKind,
    pub split: Dims3,
}

impl Level {
    pub fn new(kind: LevelKind, split: impl Into<Dims3>) -> Self {
        Self {
            kind,
            split: split.into(),
        }
    }
}

/// Validate a level list (innermost first) and return the process grid it spans.
pub fn hierarchy_dims(levels: &[Level]) -> Result<Dims3, DecompError> {
    if levels.is_empty() {
        return Err(DecompError::EmptyHierarchy);
    }
    let mut dims = Dims3::unit();
    for level in levels {
        level.split.validate("hierarchy level split")?;
        dims = dims.try_scaled(level.split, "process grid")?;
    }
    Ok(dims)
}

/// Process coordinate of `rank`.
pub fn rank_to_coord(rank: usize, levels: &[Level], order: AxisOrder) -> ProcCoord {
    let mut rest = rank;
    let mut coord = [0usize; 3];
    let mut stride = [1usize; 3];
    for level in levels {
        let mut block = rest % level.split.volume();
        rest /= level.split.volume();
        for axis in order.axes() {
            coord[axis] += (block % level.split[axis]) * stride[axis];
            block /= level.split[axis];
        }
        for axis in 0..3 {
            stride[axis] *= level.split[axis];
        }
    }
    ProcCoord(coord)
}

/// Rank owning `coord`, the inverse of [`rank_to_coord`].
///
/// Components are taken modulo the process grid.
pub fn coord_to_rank(coord: ProcCoord, levels: &[Level], order: AxisOrder) -> usize {
    let dims = levels.iter().fold(Dims3::unit(), |d, l| d.scaled(l.split));
    let c: [usize; 3] = std::array::from_fn(|a| coord[a] % dims[a]);
    let mut rank = 0;
    let mut weight = 1;
    let mut stride = [1usize; 3];
    for level in levels {
        let mut block = 0;
        let mut radix = 1;
        for axis in order.axes() {
            block += ((c[axis] / stride[axis]) % level.split[axis]) * radix;
            radix *= level.split[axis];
        }
        rank += block * weight;
        weight *= level.split.volume();
        for axis in 0..3 {
            stride[axis] *= level.split[axis];
        }
    }
    rank
}

/// Hierarchical topology bound to its own duplicate of the world communicator.
#[derive(Debug)]
pub struct HierarchicalTopology<C: Communicator> {
    comm: C,
    order: AxisOrder,
    levels: Vec<Level>,
    dims: Dims3,
    coord: ProcCoord,
    released: bool,
}

impl<C: Communicator> HierarchicalTopology<C> {
    /// Collective: build the topology on every rank of `world`.
    ///
    /// All ranks must pass the same `order` and `levels` (innermost first).
    ///
    /// # Errors
    /// Configuration errors are raised locally, before any collective call.
    /// `TopologyMismatch` if ranks disagree on the description and
    /// `GroupSizeMismatch` if the group does not fill the process grid; both
    /// are raised on every rank.
    pub fn create(world: &C, order: AxisOrder, levels: Vec<Level>) -> Result<Self, DecompError> {
        let dims = hierarchy_dims(&levels)?;
        let comm = world.duplicate()?;
        let topo = Self {
            coord: rank_to_coord(comm.rank(), &levels, order),
            comm,
            order,
            levels,
            dims,
            released: false,
        };
        // on error `topo` drops here and releases the duplicate
        agree_on(&topo.comm, topo.fingerprint())?;
        if topo.comm.size() != dims.volume() {
            return Err(DecompError::GroupSizeMismatch {
                dims: dims.0,
                expected: dims.volume(),
                actual: topo.comm.size(),
            });
        }
        log::debug!(
            "[rank {}] hierarchical topology {} ({} levels, order {}) at {:?}",
            topo.comm.rank(),
            dims,
            topo.levels.len(),
            order,
            topo.coord
        );
        Ok(topo)
    }

    pub fn order(&self) -> AxisOrder {
        self.order
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    fn fingerprint(&self) -> u64 {
        let mut h = DefaultHasher::new();
        "hierarchical".hash(&mut h);
        self.order.hash(&mut h);
        self.levels.hash(&mut h);
        h.finish()
    }

    /// Rank map of the whole process grid, one block per z-plane.
    pub fn render(&self) -> String {
        let width = (self.dims.volume() - 1).to_string().len();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "hierarchical topology {} (order {})",
            self.dims, self.order
        );
        for (i, level) in self.levels.iter().enumerate() {
            let _ = writeln!(out, "  level {i}: {:<8} {}", level.kind, level.split);
        }
        for z in 0..self.dims[2] {
            let _ = writeln!(out, "z = {z}");
            for y in (0..self.dims[1]).rev() {
                let row = (0..self.dims[0])
                    .map(|x| {
                        let r = coord_to_rank(ProcCoord::new(x, y, z), &self.levels, self.order);
                        format!("{r:>width$}")
                    })
                    .join(" ");
                let _ = writeln!(out, "  {row}");
            }
        }
        out
    }
}

impl<C: Communicator> TopologyStrategy for HierarchicalTopology<C> {
    fn process_grid(&self) -> Dims3 {
        self.dims
    }
    fn my_coord(&self) -> ProcCoord {
        self.coord
    }
    fn rank(&self) -> usize {
        self.comm.rank()
    }
    fn size(&self) -> usize {
        self.comm.size()
    }
    fn resolve(&self, coord: ProcCoord) -> usize {
        coord_to_rank(coord, &self.levels, self.order)
    }
    fn release(&mut self) -> Result<(), DecompError> {
        if self.released {
            return Err(DecompError::DoubleRelease(self.comm.handle_id()));
        }
        self.released = true;
        self.comm.free()
    }
}

impl<C: Communicator> Drop for HierarchicalTopology<C> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.release() {
                log::warn!("releasing hierarchical communicator failed: {e}");
            }
        }
    }
}
