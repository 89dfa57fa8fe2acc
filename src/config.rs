//! Serializable description of a decomposition.
//!
//! A harness typically reads this from a JSON or TOML file and hands it to
//! [`Decomposition::from_config`](crate::decomposition::Decomposition::from_config):
//!
//! ```json
//! {
//!   "topology": {
//!     "strategy": "hierarchical",
//!     "order": "xyz",
//!     "levels": [
//!       { "kind": "core", "split": [2, 2, 1] },
//!       { "kind": "node", "split": [2, 1, 1] }
//!     ]
//!   },
//!   "thread_grid": [2, 1, 1],
//!   "extents": [128, 64, 64],
//!   "extents_are_local": false
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::decomp_error::DecompError;
use crate::partitioning::{check_extents, global_extents};
use crate::topology::coords::{Dims3, NDIMS};
use crate::topology::hierarchical::{Level, hierarchy_dims};
use crate::topology::order::AxisOrder;

/// How the process grid is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum TopologyConfig {
    /// Nested levels, innermost first.
    Hierarchical {
        #[serde(default)]
        order: AxisOrder,
        levels: Vec<Level>,
    },
    /// A single periodic Cartesian grid.
    Flat { process_grid: Dims3 },
}

impl TopologyConfig {
    /// Process grid this topology will span.
    pub fn process_grid(&self) -> Result<Dims3, DecompError> {
        match self {
            TopologyConfig::Hierarchical { levels, .. } => hierarchy_dims(levels),
            TopologyConfig::Flat { process_grid } => {
                process_grid.validate("process grid")?;
                Ok(*process_grid)
            }
        }
    }
}

/// Everything needed to decompose a grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionConfig {
    pub topology: TopologyConfig,
    /// Logical workers per process, per axis.
    pub thread_grid: Dims3,
    /// Whole-grid extent, or per-worker extent when `extents_are_local` is set.
    pub extents: [usize; NDIMS],
    #[serde(default)]
    pub extents_are_local: bool,
}

impl DecompositionConfig {
    /// Run every check that needs no communication.
    pub fn validate(&self) -> Result<(), DecompError> {
        let procs = self.topology.process_grid()?;
        self.thread_grid.validate("thread grid")?;
        let lines = procs.try_scaled(self.thread_grid, "line grid")?;
        check_extents(
            global_extents(self.extents, lines, self.extents_are_local)?,
            lines,
        )
    }

    /// Grid lines per axis (process grid x thread grid).
    pub fn lines(&self) -> Result<Dims3, DecompError> {
        self.topology
            .process_grid()?
            .try_scaled(self.thread_grid, "line grid")
    }
}
