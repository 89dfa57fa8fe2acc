#![cfg_attr(docsrs, feature(doc_cfg))]
//! # grid-decomp
//!
//! grid-decomp splits a structured 3-D grid across a cluster of processes and,
//! inside each process, across a fixed grid of logical workers. It answers the
//! two questions a halo-exchange or stencil engine keeps asking:
//!
//! - which sub-domain (offset, extent) does worker `W` own?
//! - which worker, possibly on another process, owns the sub-domain next to
//!   `W` in direction `(dx, dy, dz)`? Every axis is periodic.
//!
//! ## Features
//! - Near-equal, remainder-aware partition of every axis
//! - Hierarchical process grids (nested levels with an axis ordering) or flat
//!   periodic Cartesian grids, behind one [`TopologyStrategy`](topology::TopologyStrategy) contract
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - Serde-friendly configuration
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! grid-decomp = "0.3"
//! # features = ["mpi-support"]
//! ```
//!
//! ## Determinism
//!
//! Partition tables and rank/coordinate maps are pure functions of the
//! configuration, so every rank derives identical tables without exchanging
//! them. Construction only communicates to agree on the configuration.

pub mod algs;
pub mod config;
pub mod debug_invariants;
pub mod decomp_error;
pub mod decomposition;
pub mod partitioning;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CartesianTopology, Communicator, LocalComm, NoComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::config::{DecompositionConfig, TopologyConfig};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::decomp_error::{DecompError, ErrorKind};
    pub use crate::decomposition::{Decomposition, Domain};
    pub use crate::partitioning::AxisPartition;
    pub use crate::topology::coords::{Dims3, Direction, GlobalCoord, ProcCoord, ThreadCoord};
    pub use crate::topology::hierarchical::{Level, LevelKind};
    pub use crate::topology::order::AxisOrder;
    pub use crate::topology::strategy::{Topology, TopologyStrategy};
}
