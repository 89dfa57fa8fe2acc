//! Flat Cartesian process grids.
//!
//! The process grid is given directly and rank lookup is delegated to the
//! substrate's periodic Cartesian communicator. The Cartesian communicator is
//! the only handle this strategy owns.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::coords::{Dims3, ProcCoord};
use super::strategy::{TopologyStrategy, agree_on};
use crate::algs::communicator::{CartesianTopology, Communicator};
use crate::decomp_error::DecompError;

pub struct FlatCartesian<C: Communicator> {
    cart: C::Cart,
    dims: Dims3,
    coord: ProcCoord,
    size: usize,
    released: bool,
}

impl<C: Communicator> FlatCartesian<C> {
    /// Collective: build a periodic `dims` process grid over `world`.
    pub fn create(world: &C, dims: Dims3) -> Result<Self, DecompError> {
        dims.validate("process grid")?;
        let mut h = DefaultHasher::new();
        "flat".hash(&mut h);
        dims.hash(&mut h);
        agree_on(world, h.finish())?;

        let cart = world.create_cartesian(dims)?;
        let coord = cart.coords_of(cart.rank());
        log::debug!(
            "[rank {}] flat cartesian topology {} at {:?}",
            cart.rank(),
            dims,
            coord
        );
        Ok(Self {
            cart,
            dims,
            coord,
            size: world.size(),
            released: false,
        })
    }

    pub fn cart(&self) -> &C::Cart {
        &self.cart
    }
}

impl<C: Communicator> std::fmt::Debug for FlatCartesian<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatCartesian")
            .field("dims", &self.dims)
            .field("coord", &self.coord)
            .field("released", &self.released)
            .finish()
    }
}

impl<C: Communicator> TopologyStrategy for FlatCartesian<C> {
    fn process_grid(&self) -> Dims3 {
        self.dims
    }
    fn my_coord(&self) -> ProcCoord {
        self.coord
    }
    fn rank(&self) -> usize {
        self.cart.rank()
    }
    fn size(&self) -> usize {
        self.size
    }
    fn resolve(&self, coord: ProcCoord) -> usize {
        self.cart.rank_of(coord)
    }
    fn release(&mut self) -> Result<(), DecompError> {
        if self.released {
            return Err(DecompError::DoubleRelease(self.cart.handle_id()));
        }
        self.released = true;
        self.cart.free()
    }
}

impl<C: Communicator> Drop for FlatCartesian<C> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.release() {
                log::warn!("releasing cartesian communicator failed: {e}");
            }
        }
    }
}
