//! Partitioning of the global grid into per-worker sub-domains.

pub mod axis;

pub use axis::AxisPartition;

use crate::decomp_error::DecompError;
use crate::topology::coords::{Dims3, NDIMS};

/// Global extent per axis, optionally expanded from a per-line extent.
///
/// With `extents_are_local`, `extents` is the size of one worker's
/// sub-domain and is multiplied by the number of grid lines on that axis.
///
/// # Errors
/// `ExtentOverflow` if that product does not fit in `usize`.
pub fn global_extents(
    extents: [usize; NDIMS],
    lines: Dims3,
    extents_are_local: bool,
) -> Result<[usize; NDIMS], DecompError> {
    if !extents_are_local {
        return Ok(extents);
    }
    let mut global = [0usize; NDIMS];
    for (axis, slot) in global.iter_mut().enumerate() {
        *slot = extents[axis]
            .checked_mul(lines[axis])
            .ok_or(DecompError::ExtentOverflow {
                axis,
                extent: extents[axis],
                lines: lines[axis],
            })?;
    }
    Ok(global)
}

/// Partition every axis of `extents` into `lines` near-equal runs.
pub fn partition_axes(
    extents: [usize; NDIMS],
    lines: Dims3,
) -> Result<[AxisPartition; NDIMS], DecompError> {
    Ok([
        AxisPartition::new(0, extents[0], lines[0])?,
        AxisPartition::new(1, extents[1], lines[1])?,
        AxisPartition::new(2, extents[2], lines[2])?,
    ])
}

/// Check that `extents` can be split into `lines` without empty runs.
pub fn check_extents(extents: [usize; NDIMS], lines: Dims3) -> Result<(), DecompError> {
    for axis in 0..NDIMS {
        if extents[axis] < lines[axis] {
            return Err(DecompError::ExtentTooSmall {
                axis,
                extent: extents[axis],
                lines: lines[axis],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_extents_scale_by_line_count() {
        let lines = Dims3::new(4, 2, 1);
        assert_eq!(global_extents([8, 8, 8], lines, true), Ok([32, 16, 8]));
        assert_eq!(global_extents([8, 8, 8], lines, false), Ok([8, 8, 8]));
    }

    #[test]
    fn local_extents_that_overflow_are_rejected() {
        let huge = usize::MAX / 2 + 1;
        assert_eq!(
            global_extents([4, huge, 1], Dims3::new(1, 2, 1), true),
            Err(DecompError::ExtentOverflow {
                axis: 1,
                extent: huge,
                lines: 2
            })
        );
        // a whole-grid extent is taken as is
        assert_eq!(
            global_extents([4, huge, 1], Dims3::new(1, 2, 1), false),
            Ok([4, huge, 1])
        );
    }

    #[test]
    fn partitions_each_axis() {
        let parts = partition_axes([10, 7, 3], Dims3::new(3, 2, 1)).unwrap();
        assert_eq!(parts[0].extents(), &[4, 3, 3]);
        assert_eq!(parts[1].extents(), &[4, 3]);
        assert_eq!(parts[2].extents(), &[3]);
    }

    #[test]
    fn check_reports_first_bad_axis() {
        assert!(check_extents([4, 4, 4], Dims3::new(4, 4, 4)).is_ok());
        assert_eq!(
            check_extents([4, 1, 0], Dims3::new(2, 2, 2)),
            Err(DecompError::ExtentTooSmall {
                axis: 1,
                extent: 1,
                lines: 2
            })
        );
    }
}
