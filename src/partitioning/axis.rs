//! Near-equal partition of one axis of the global grid.
//!
//! Splitting `extent` cells into `lines` contiguous runs gives every run
//! `extent / lines` cells and hands the `extent % lines` leftover cells to
//! the first runs, one each. The table is a pure function of its two inputs,
//! so every rank derives the same table independently.

use crate::debug_invariants::{DebugInvariants, ensure};
use crate::decomp_error::DecompError;

/// Offsets and extents of the grid lines along one axis.
///
/// # Invariants
///
/// - `offsets.len() == extents.len() + 1`
/// - `offsets[0] == 0`, `offsets[lines] == global_extent`
/// - `extents[i] == offsets[i + 1] - offsets[i]` and `extents[i] > 0`
/// - extents differ by at most one, larger ones first
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AxisPartition {
    offsets: Vec<usize>,
    extents: Vec<usize>,
}

impl AxisPartition {
    /// Split `global_extent` cells into `lines` near-equal runs.
    ///
    /// # Errors
    /// `InvalidDim` if `lines == 0`, `ExtentTooSmall` if some run would be
    /// empty (`global_extent < lines`). `axis` is only used for reporting.
    pub fn new(axis: usize, global_extent: usize, lines: usize) -> Result<Self, DecompError> {
        if lines == 0 {
            let mut dims = [1; 3];
            dims[axis.min(2)] = 0;
            return Err(DecompError::InvalidDim {
                what: "line count",
                dims,
            });
        }
        if global_extent < lines {
            return Err(DecompError::ExtentTooSmall {
                axis,
                extent: global_extent,
                lines,
            });
        }
        let base = global_extent / lines;
        let remainder = global_extent - base * lines;

        let mut offsets = Vec::with_capacity(lines + 1);
        let mut extents = Vec::with_capacity(lines);
        offsets.push(0);
        for i in 0..lines {
            let ext = base + usize::from(i < remainder);
            extents.push(ext);
            offsets.push(offsets[i] + ext);
        }
        let part = Self { offsets, extents };
        crate::debug_invariants!(part.validate_invariants(), "AxisPartition::new");
        log::debug!(
            "axis {axis}: {global_extent} cells over {lines} lines ({remainder} x {}, {} x {base})",
            base + 1,
            lines - remainder
        );
        Ok(part)
    }

    /// Number of grid lines.
    #[inline]
    pub fn lines(&self) -> usize {
        self.extents.len()
    }

    /// Total number of cells on the axis.
    #[inline]
    pub fn global_extent(&self) -> usize {
        self.offsets[self.lines()]
    }

    /// First cell of line `i`.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.offsets[i]
    }

    /// Number of cells of line `i`.
    #[inline]
    pub fn extent(&self, i: usize) -> usize {
        self.extents[i]
    }

    /// All `lines + 1` cumulative offsets.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// `(offset, extent)` of every line, in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.offsets.iter().copied().zip(self.extents.iter().copied())
    }
}

impl DebugInvariants for AxisPartition {
    fn validate_invariants(&self) -> Result<(), DecompError> {
        let lines = self.extents.len();
        ensure(lines > 0, || "no lines".into())?;
        ensure(self.offsets.len() == lines + 1, || {
            format!("{} offsets for {lines} lines", self.offsets.len())
        })?;
        ensure(self.offsets[0] == 0, || "first offset is not zero".into())?;
        for (i, &ext) in self.extents.iter().enumerate() {
            ensure(ext > 0, || format!("line {i} is empty"))?;
            ensure(self.offsets[i + 1] == self.offsets[i] + ext, || {
                format!("offset {} does not follow line {i}", i + 1)
            })?;
        }
        if let Some(w) = self.extents.windows(2).position(|w| w[1] > w[0]) {
            return Err(DecompError::InvariantViolation(format!(
                "line {} is longer than line {w}",
                w + 1
            )));
        }
        let (first, last) = (self.extents[0], self.extents[lines - 1]);
        ensure(first - last <= 1, || format!("extents range from {last} to {first}"))
    }
}
