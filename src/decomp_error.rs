//! DecompError: Unified error type for grid-decomp public APIs
//!
//! Every fallible operation in the crate returns `Result<_, DecompError>`.
//! Variants are classified by [`DecompError::kind`]. Only local
//! configuration problems are recoverable; collective topology mismatches,
//! communicator resource misuse and substrate failures are fatal for the
//! whole process group.

use thiserror::Error;

/// Broad class of a [`DecompError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid static parameters, detected locally before any collective call.
    Configuration,
    /// Ranks disagreed on the topology during the collective creation call.
    TopologyMismatch,
    /// Communicator released twice, or released without having been created.
    Resource,
    /// The communication substrate itself failed.
    Substrate,
    /// An internal table broke one of its invariants.
    Invariant,
}

/// Unified error type for decomposition operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompError {
    /// A grid dimension (process grid, thread grid or level split) was zero.
    #[error("Configuration error: {what} must be positive on every axis, got {dims:?}")]
    InvalidDim { what: &'static str, dims: [usize; 3] },
    /// A hierarchical topology was configured without any level.
    #[error("Configuration error: hierarchical topology needs at least one level")]
    EmptyHierarchy,
    /// The global extent of an axis is smaller than its number of grid lines.
    #[error(
        "Configuration error: extent {extent} on axis {axis} cannot be split into {lines} non-empty lines"
    )]
    ExtentTooSmall {
        axis: usize,
        extent: usize,
        lines: usize,
    },
    /// A per-worker extent times the line count of its axis does not fit in `usize`.
    #[error("Configuration error: local extent {extent} x {lines} lines overflows on axis {axis}")]
    ExtentOverflow {
        axis: usize,
        extent: usize,
        lines: usize,
    },
    /// A grid has more cells than `usize` can count.
    #[error("Configuration error: {what} {dims:?} has too many cells")]
    GridTooLarge { what: &'static str, dims: [usize; 3] },
    /// An axis order string was not a permutation of `xyz`.
    #[error("Configuration error: `{0}` is not an axis order (expected a permutation of xyz)")]
    InvalidAxisOrder(String),
    /// A hierarchy level name was not recognised.
    #[error("Configuration error: unknown hierarchy level kind `{0}`")]
    InvalidLevelKind(String),
    /// A local thread id outside `[0, threads_per_rank)`.
    #[error("Thread id {id} out of range (this rank owns {threads} threads)")]
    ThreadIdOutOfRange { id: usize, threads: usize },
    /// The communicator group does not hold exactly one rank per process-grid cell.
    #[error("Topology mismatch: process grid {dims:?} needs {expected} ranks, group has {actual}")]
    GroupSizeMismatch {
        dims: [usize; 3],
        expected: usize,
        actual: usize,
    },
    /// Ranks passed different topology descriptions to the collective creation call.
    #[error("Topology mismatch: rank {rank} disagrees with rank 0 on the topology description")]
    TopologyMismatch { rank: usize },
    /// A communicator handle was released a second time.
    #[error("Resource error: communicator handle {0} released twice")]
    DoubleRelease(u64),
    /// A communicator handle was released that was never created.
    #[error("Resource error: communicator handle {0} was never created")]
    UnknownHandle(u64),
    /// Backend failure reported by the communication substrate.
    #[error("Substrate error: {0}")]
    Substrate(String),
    /// A partition table or coordinate map failed validation.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl DecompError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecompError::InvalidDim { .. }
            | DecompError::EmptyHierarchy
            | DecompError::ExtentTooSmall { .. }
            | DecompError::ExtentOverflow { .. }
            | DecompError::GridTooLarge { .. }
            | DecompError::InvalidAxisOrder(_)
            | DecompError::InvalidLevelKind(_)
            | DecompError::ThreadIdOutOfRange { .. } => ErrorKind::Configuration,
            DecompError::GroupSizeMismatch { .. } | DecompError::TopologyMismatch { .. } => {
                ErrorKind::TopologyMismatch
            }
            DecompError::DoubleRelease(_) | DecompError::UnknownHandle(_) => ErrorKind::Resource,
            DecompError::Substrate(_) => ErrorKind::Substrate,
            DecompError::InvariantViolation(_) => ErrorKind::Invariant,
        }
    }

    /// Whether the whole process group has to give up.
    ///
    /// Only configuration errors can be fixed by the caller and retried.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Configuration
    }
}
