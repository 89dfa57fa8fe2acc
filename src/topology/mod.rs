//! Process-grid topologies and coordinate arithmetic.

pub mod cartesian;
pub mod coords;
pub mod hierarchical;
pub mod mapping;
pub mod order;
pub mod strategy;

pub use coords::{Dims3, Direction, GlobalCoord, NDIMS, ProcCoord, ThreadCoord};
pub use strategy::{Topology, TopologyStrategy};
