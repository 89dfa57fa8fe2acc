//! Thin façade over the process-communication substrate.
//!
//! The decomposition only needs a handful of primitives from the substrate:
//! rank/size queries, one collective (an all-gather of a `u64`), duplication
//! of a communicator, and a periodic Cartesian communicator that maps ranks to
//! grid coordinates and back. Three backends are provided:
//!
//! - [`NoComm`]: a single process, every collective is trivial.
//! - [`LocalComm`]: N ranks living on threads of one process. Collectives
//!   rendezvous on a shared group; handles are tracked so that lifecycle bugs
//!   (double release, release of a handle that was never created) surface as
//!   resource errors.
//! - `MpiComm` (feature `mpi-support`): rsmpi communicators.

use dashmap::{DashMap, DashSet};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::decomp_error::DecompError;
use crate::topology::coords::{Dims3, ProcCoord};

/// Collective communication interface consumed by the topology strategies.
pub trait Communicator: Sized {
    /// Periodic Cartesian communicator created by [`create_cartesian`](Self::create_cartesian).
    type Cart: CartesianTopology;

    /// This process's rank within the communicator.
    fn rank(&self) -> usize;
    /// Number of ranks in the communicator.
    fn size(&self) -> usize;
    /// Identifier of the underlying handle, for diagnostics.
    fn handle_id(&self) -> u64;

    /// Collective: every rank contributes `value`, every rank receives all
    /// contributions indexed by rank.
    fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, DecompError>;

    /// Collective: a new communicator over the same group.
    fn duplicate(&self) -> Result<Self, DecompError>;

    /// Collective: a fully periodic Cartesian communicator of shape `dims`.
    ///
    /// The group must hold exactly `dims.volume()` ranks.
    fn create_cartesian(&self, dims: Dims3) -> Result<Self::Cart, DecompError>;

    /// Release a communicator obtained from [`duplicate`](Self::duplicate).
    fn free(&self) -> Result<(), DecompError>;
}

/// Rank/coordinate lookup on a periodic Cartesian communicator.
///
/// Ranks are numbered row-major (last axis fastest), the convention of MPI
/// Cartesian topologies.
pub trait CartesianTopology {
    /// This process's rank within the Cartesian communicator.
    fn rank(&self) -> usize;
    fn dims(&self) -> Dims3;
    fn coords_of(&self, rank: usize) -> ProcCoord;
    /// Rank owning `coord`; components are taken modulo the grid shape.
    fn rank_of(&self, coord: ProcCoord) -> usize;
    /// Identifier of the underlying handle, for diagnostics.
    fn handle_id(&self) -> u64;
    /// Release the communicator.
    fn free(&self) -> Result<(), DecompError>;
}

/// Row-major rank of `coord` on a periodic grid of shape `dims`.
fn row_major_rank(coord: ProcCoord, dims: Dims3) -> usize {
    (0..3).fold(0, |acc, a| acc * dims[a] + coord[a] % dims[a])
}

/// Inverse of [`row_major_rank`].
fn row_major_coords(rank: usize, dims: Dims3) -> ProcCoord {
    let mut r = rank;
    let mut c = [0; 3];
    for a in (0..3).rev() {
        c[a] = r % dims[a];
        r /= dims[a];
    }
    ProcCoord(c)
}

/// Cartesian communicator of the in-process backends.
#[derive(Debug)]
pub struct LocalCart {
    rank: usize,
    dims: Dims3,
    id: u64,
    group: Option<Arc<LocalGroup>>,
}

impl CartesianTopology for LocalCart {
    fn rank(&self) -> usize {
        self.rank
    }
    fn dims(&self) -> Dims3 {
        self.dims
    }
    fn coords_of(&self, rank: usize) -> ProcCoord {
        row_major_coords(rank, self.dims)
    }
    fn rank_of(&self, coord: ProcCoord) -> usize {
        row_major_rank(coord, self.dims)
    }
    fn handle_id(&self) -> u64 {
        self.id
    }
    fn free(&self) -> Result<(), DecompError> {
        match &self.group {
            Some(g) => g.release(self.rank, self.id),
            None => Ok(()),
        }
    }
}

/// Compile-time no-op comm for pure serial runs: one rank, trivial collectives.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type Cart = LocalCart;

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn handle_id(&self) -> u64 {
        0
    }
    fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, DecompError> {
        Ok(vec![value])
    }
    fn duplicate(&self) -> Result<Self, DecompError> {
        Ok(NoComm)
    }
    fn create_cartesian(&self, dims: Dims3) -> Result<LocalCart, DecompError> {
        if dims.volume() != 1 {
            return Err(DecompError::GroupSizeMismatch {
                dims: dims.0,
                expected: dims.volume(),
                actual: 1,
            });
        }
        Ok(LocalCart {
            rank: 0,
            dims,
            id: 0,
            group: None,
        })
    }
    fn free(&self) -> Result<(), DecompError> {
        Ok(())
    }
}

// --- LocalComm: N ranks on threads of one process ---

#[derive(Debug, Default)]
struct GatherState {
    round: u64,
    arrived: usize,
    slots: Vec<u64>,
    last: Arc<Vec<u64>>,
}

/// Rendezvous point and handle registry shared by the ranks of a [`LocalComm`] group.
///
/// Released handle ids are remembered for the lifetime of the group so that a
/// second release can be told apart from an unknown id. The registry grows by
/// one entry per handle ever created; groups are meant to live for one run or
/// one test.
#[derive(Debug)]
pub struct LocalGroup {
    size: usize,
    gather: Mutex<GatherState>,
    done: Condvar,
    next_id: AtomicU64,
    live: DashMap<(usize, u64), &'static str>,
    // never pruned, see the type docs
    retired: DashSet<(usize, u64)>,
}

impl LocalGroup {
    fn new(size: usize) -> Self {
        Self {
            size,
            gather: Mutex::new(GatherState {
                slots: vec![0; size],
                ..Default::default()
            }),
            done: Condvar::new(),
            // id 0 is the world handle, which is never released
            next_id: AtomicU64::new(1),
            live: DashMap::new(),
            retired: DashSet::new(),
        }
    }

    fn all_gather(&self, rank: usize, value: u64) -> Vec<u64> {
        let mut st = self.gather.lock();
        let round = st.round;
        st.slots[rank] = value;
        st.arrived += 1;
        if st.arrived == self.size {
            let gathered = std::mem::replace(&mut st.slots, vec![0; self.size]);
            st.last = Arc::new(gathered);
            st.arrived = 0;
            st.round += 1;
            self.done.notify_all();
        } else {
            while st.round == round {
                self.done.wait(&mut st);
            }
        }
        // The next round cannot complete before this rank joins it, so `last`
        // still holds this round's result.
        st.last.as_ref().clone()
    }

    fn register(&self, rank: usize, what: &'static str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live.insert((rank, id), what);
        log::debug!("[rank {rank}] created {what} handle {id}");
        id
    }

    fn release(&self, rank: usize, id: u64) -> Result<(), DecompError> {
        if let Some((_, what)) = self.live.remove(&(rank, id)) {
            self.retired.insert((rank, id));
            log::debug!("[rank {rank}] released {what} handle {id}");
            Ok(())
        } else if self.retired.contains(&(rank, id)) {
            Err(DecompError::DoubleRelease(id))
        } else {
            Err(DecompError::UnknownHandle(id))
        }
    }

    /// Number of handles created on `rank` and not yet released.
    pub fn live_handles(&self, rank: usize) -> usize {
        self.live.iter().filter(|e| e.key().0 == rank).count()
    }
}

/// One rank of an in-process communicator group.
///
/// Every rank of a group must be driven from its own thread, since
/// collectives block until all ranks have joined.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    id: u64,
    group: Arc<LocalGroup>,
}

impl LocalComm {
    /// The world communicators of a fresh group of `size` ranks, indexed by rank.
    pub fn group(size: usize) -> Vec<LocalComm> {
        let group = Arc::new(LocalGroup::new(size));
        (0..size)
            .map(|rank| LocalComm {
                rank,
                id: 0,
                group: group.clone(),
            })
            .collect()
    }

    /// The shared group, for inspecting handle bookkeeping.
    pub fn local_group(&self) -> &Arc<LocalGroup> {
        &self.group
    }
}

impl Communicator for LocalComm {
    type Cart = LocalCart;

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.group.size
    }
    fn handle_id(&self) -> u64 {
        self.id
    }
    fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, DecompError> {
        Ok(self.group.all_gather(self.rank, value))
    }
    fn duplicate(&self) -> Result<Self, DecompError> {
        self.group.all_gather(self.rank, self.id);
        Ok(LocalComm {
            rank: self.rank,
            id: self.group.register(self.rank, "duplicate"),
            group: self.group.clone(),
        })
    }
    fn create_cartesian(&self, dims: Dims3) -> Result<LocalCart, DecompError> {
        self.group.all_gather(self.rank, dims.volume() as u64);
        if dims.volume() != self.size() {
            return Err(DecompError::GroupSizeMismatch {
                dims: dims.0,
                expected: dims.volume(),
                actual: self.size(),
            });
        }
        Ok(LocalCart {
            rank: self.rank,
            dims,
            id: self.group.register(self.rank, "cartesian"),
            group: Some(self.group.clone()),
        })
    }
    fn free(&self) -> Result<(), DecompError> {
        self.group.release(self.rank, self.id)
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::topology::{CartesianCommunicator, SimpleCommunicator};
    use mpi::traits::{Communicator as MpiCommunicator, CommunicatorCollectives};
    use std::rc::Rc;

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    /// rsmpi communicator. MPI handles are freed when the Rust value drops;
    /// `free` only logs.
    pub struct MpiComm {
        // dropped before `universe`, which finalizes MPI
        comm: SimpleCommunicator,
        id: u64,
        universe: Rc<Universe>,
    }

    impl MpiComm {
        /// Initialize MPI and wrap `MPI_COMM_WORLD`.
        pub fn new() -> Result<Self, DecompError> {
            let universe = mpi::initialize()
                .ok_or_else(|| DecompError::Substrate("MPI already initialized".into()))?;
            let comm = universe.world();
            Ok(Self {
                comm,
                id: 0,
                universe: Rc::new(universe),
            })
        }
    }

    /// rsmpi Cartesian communicator. Holds the universe so that MPI outlives
    /// the handle even after the world `MpiComm` is dropped.
    pub struct MpiCart {
        // dropped before `universe`
        comm: CartesianCommunicator,
        dims: Dims3,
        id: u64,
        universe: Rc<Universe>,
    }

    impl MpiCart {
        /// Number of live references to the MPI environment, this handle included.
        pub fn universe_refs(&self) -> usize {
            Rc::strong_count(&self.universe)
        }
    }

    impl CartesianTopology for MpiCart {
        fn rank(&self) -> usize {
            self.comm.rank() as usize
        }
        fn dims(&self) -> Dims3 {
            self.dims
        }
        fn coords_of(&self, rank: usize) -> ProcCoord {
            let c = self.comm.rank_to_coordinates(rank as i32);
            ProcCoord(std::array::from_fn(|a| c[a] as usize))
        }
        fn rank_of(&self, coord: ProcCoord) -> usize {
            let c: Vec<i32> = coord.0.iter().map(|&x| x as i32).collect();
            self.comm.coordinates_to_rank(&c) as usize
        }
        fn handle_id(&self) -> u64 {
            self.id
        }
        fn free(&self) -> Result<(), DecompError> {
            log::debug!("[rank {}] releasing cartesian handle {}", self.rank(), self.id);
            Ok(())
        }
    }

    impl Communicator for MpiComm {
        type Cart = MpiCart;

        fn rank(&self) -> usize {
            self.comm.rank() as usize
        }
        fn size(&self) -> usize {
            self.comm.size() as usize
        }
        fn handle_id(&self) -> u64 {
            self.id
        }
        fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>, DecompError> {
            let mut out = vec![0u64; self.size()];
            self.comm.all_gather_into(&value, &mut out[..]);
            Ok(out)
        }
        fn duplicate(&self) -> Result<Self, DecompError> {
            Ok(MpiComm {
                comm: self.comm.duplicate(),
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                universe: self.universe.clone(),
            })
        }
        fn create_cartesian(&self, dims: Dims3) -> Result<MpiCart, DecompError> {
            let d: Vec<i32> = dims.0.iter().map(|&x| x as i32).collect();
            if dims.volume() != self.size() {
                return Err(DecompError::GroupSizeMismatch {
                    dims: dims.0,
                    expected: dims.volume(),
                    actual: self.size(),
                });
            }
            let comm = self
                .comm
                .create_cartesian_communicator(&d, &[true; 3], true)
                .ok_or_else(|| {
                    DecompError::Substrate("failed to create Cartesian communicator".into())
                })?;
            Ok(MpiCart {
                comm,
                dims,
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                universe: self.universe.clone(),
            })
        }
        fn free(&self) -> Result<(), DecompError> {
            log::debug!("[rank {}] releasing duplicate handle {}", self.rank(), self.id);
            Ok(())
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiCart, MpiComm};
