//! Axis orderings for hierarchical rank numbering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decomp_error::DecompError;

/// A permutation of the three axes, listed fastest-varying first.
///
/// `AxisOrder::XYZ` numbers the cells of a level with x fastest and z
/// slowest; `AxisOrder::ZYX` the other way round.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AxisOrder([usize; 3]);

impl AxisOrder {
    pub const XYZ: AxisOrder = AxisOrder([0, 1, 2]);
    pub const XZY: AxisOrder = AxisOrder([0, 2, 1]);
    pub const YXZ: AxisOrder = AxisOrder([1, 0, 2]);
    pub const YZX: AxisOrder = AxisOrder([1, 2, 0]);
    pub const ZXY: AxisOrder = AxisOrder([2, 0, 1]);
    pub const ZYX: AxisOrder = AxisOrder([2, 1, 0]);

    /// Axes from fastest to slowest.
    pub fn axes(&self) -> [usize; 3] {
        self.0
    }
}

impl Default for AxisOrder {
    fn default() -> Self {
        AxisOrder::XYZ
    }
}

impl FromStr for AxisOrder {
    type Err = DecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut axes = [usize::MAX; 3];
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != 3 {
            return Err(DecompError::InvalidAxisOrder(s.to_string()));
        }
        for (slot, ch) in axes.iter_mut().zip(chars) {
            *slot = match ch.to_ascii_lowercase() {
                'x' => 0,
                'y' => 1,
                'z' => 2,
                _ => return Err(DecompError::InvalidAxisOrder(s.to_string())),
            };
        }
        let mut seen = axes;
        seen.sort_unstable();
        if seen != [0, 1, 2] {
            return Err(DecompError::InvalidAxisOrder(s.to_string()));
        }
        Ok(AxisOrder(axes))
    }
}

impl TryFrom<String> for AxisOrder {
    type Error = DecompError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AxisOrder> for String {
    fn from(o: AxisOrder) -> String {
        o.to_string()
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &a in &self.0 {
            f.write_str(["x", "y", "z"][a])?;
        }
        Ok(())
    }
}

impl fmt::Debug for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AxisOrder({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_permutations() {
        for (s, o) in [
            ("xyz", AxisOrder::XYZ),
            ("xzy", AxisOrder::XZY),
            ("yxz", AxisOrder::YXZ),
            ("yzx", AxisOrder::YZX),
            ("zxy", AxisOrder::ZXY),
            ("ZYX", AxisOrder::ZYX),
        ] {
            assert_eq!(s.parse::<AxisOrder>().unwrap(), o);
        }
        assert_eq!(AxisOrder::ZXY.to_string(), "zxy");
    }

    #[test]
    fn rejects_non_permutations() {
        for s in ["xxy", "xy", "xyzz", "abc", ""] {
            assert!(matches!(
                s.parse::<AxisOrder>(),
                Err(DecompError::InvalidAxisOrder(_))
            ));
        }
    }
}
