//! Grid sizes and the three coordinate spaces of a decomposition.
//!
//! A decomposition nests two grids: the *process grid* (one cell per rank)
//! and, inside every process, the *thread grid* (one cell per logical
//! worker). Their product is the *combined torus* addressed by
//! [`GlobalCoord`]. Each space gets its own newtype so that a process
//! coordinate can never be handed to code expecting a global one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

use crate::decomp_error::DecompError;

/// Number of spatial axes.
pub const NDIMS: usize = 3;

/// Extent of a rectangular grid, one entry per axis.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dims3(pub [usize; NDIMS]);

impl Dims3 {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Dims3([x, y, z])
    }

    /// A single-cell grid.
    pub const fn unit() -> Self {
        Dims3([1, 1, 1])
    }

    /// Number of cells in the grid.
    ///
    /// Only meaningful for grids that passed [`validate`](Self::validate).
    #[inline]
    pub fn volume(&self) -> usize {
        self.0.iter().product()
    }

    /// Number of cells, or `None` if it does not fit in `usize`.
    pub fn checked_volume(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Axis-wise product of two validated grids.
    #[inline]
    pub fn scaled(&self, other: Dims3) -> Dims3 {
        Dims3(std::array::from_fn(|a| self.0[a] * other.0[a]))
    }

    /// Axis-wise product of two grids, validated as `what`.
    ///
    /// # Errors
    /// `GridTooLarge` if an axis or the cell count overflows `usize`.
    pub fn try_scaled(&self, other: Dims3, what: &'static str) -> Result<Dims3, DecompError> {
        let mut out = [0usize; NDIMS];
        for (a, slot) in out.iter_mut().enumerate() {
            *slot = self.0[a]
                .checked_mul(other.0[a])
                .ok_or_else(|| DecompError::GridTooLarge {
                    what,
                    dims: std::array::from_fn(|b| self.0[b].saturating_mul(other.0[b])),
                })?;
        }
        let dims = Dims3(out);
        dims.validate(what)?;
        Ok(dims)
    }

    /// Reject grids with an empty axis or an uncountable number of cells.
    pub fn validate(&self, what: &'static str) -> Result<(), DecompError> {
        if self.0.contains(&0) {
            return Err(DecompError::InvalidDim { what, dims: self.0 });
        }
        if self.checked_volume().is_none() {
            return Err(DecompError::GridTooLarge { what, dims: self.0 });
        }
        Ok(())
    }

    pub fn as_array(&self) -> [usize; NDIMS] {
        self.0
    }
}

impl Index<usize> for Dims3 {
    type Output = usize;
    #[inline]
    fn index(&self, axis: usize) -> &usize {
        &self.0[axis]
    }
}

impl From<[usize; NDIMS]> for Dims3 {
    fn from(d: [usize; NDIMS]) -> Self {
        Dims3(d)
    }
}

impl fmt::Debug for Dims3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Display for Dims3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

macro_rules! coord_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub [usize; NDIMS]);

        impl $name {
            pub const fn new(x: usize, y: usize, z: usize) -> Self {
                $name([x, y, z])
            }

            pub fn as_array(&self) -> [usize; NDIMS] {
                self.0
            }

            /// Whether every component lies inside `dims`.
            pub fn within(&self, dims: Dims3) -> bool {
                self.0.iter().zip(dims.0.iter()).all(|(c, d)| c < d)
            }
        }

        impl Index<usize> for $name {
            type Output = usize;
            #[inline]
            fn index(&self, axis: usize) -> &usize {
                &self.0[axis]
            }
        }

        impl From<[usize; NDIMS]> for $name {
            fn from(c: [usize; NDIMS]) -> Self {
                $name(c)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}, {}, {})", stringify!($name), self.0[0], self.0[1], self.0[2])
            }
        }
    };
}

coord_type!(
    /// Position of a rank in the process grid.
    ProcCoord
);
coord_type!(
    /// Position of a logical worker in its process's thread grid.
    ThreadCoord
);
coord_type!(
    /// Position in the combined (process grid x thread grid) torus.
    GlobalCoord
);

/// Signed displacement between two cells of the combined torus.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Direction(pub [isize; NDIMS]);

impl Direction {
    pub const fn new(dx: isize, dy: isize, dz: isize) -> Self {
        Direction([dx, dy, dz])
    }

    /// The opposite displacement.
    pub fn reversed(&self) -> Self {
        Direction(self.0.map(|d| -d))
    }

    /// All 26 non-zero unit displacements of a 3x3x3 stencil, x fastest.
    pub fn stencil26() -> impl Iterator<Item = Direction> {
        itertools::iproduct!(-1isize..=1, -1isize..=1, -1isize..=1)
            .map(|(dz, dy, dx)| Direction::new(dx, dy, dz))
            .filter(|d| d.0 != [0, 0, 0])
    }
}
