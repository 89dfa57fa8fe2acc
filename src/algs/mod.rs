//! Communication substrate used by the topology strategies.

pub mod communicator;
