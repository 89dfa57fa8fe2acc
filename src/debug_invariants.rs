//! Self-checks for the tables a decomposition derives from its configuration.
//!
//! Partition tables and rank maps are computed independently on every rank,
//! so a broken table silently disagrees with the neighbours' copies. Types
//! holding such tables implement [`DebugInvariants`]; constructors run the
//! check through [`debug_invariants!`](crate::debug_invariants) in debug builds.

use crate::decomp_error::DecompError;

pub trait DebugInvariants {
    /// Validate invariants and return the first violation found.
    fn validate_invariants(&self) -> Result<(), DecompError>;

    /// Panic on a violated invariant; a no-op in release builds.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "debug_assert_invariants");
    }
}

/// `Ok(())` if `cond` holds, otherwise an `InvariantViolation` built from `msg`.
pub fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), DecompError> {
    if cond {
        Ok(())
    } else {
        Err(DecompError::InvariantViolation(msg()))
    }
}

/// Run a fallible invariant check and panic with `ctx` on failure (debug builds only).
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(debug_assertions)]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
