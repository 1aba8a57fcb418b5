//! The comparison flag set by `cmp` and read by conditional jumps.

use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::fmt;

/// Result of the most recent `cmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// No comparison has run yet.
    #[default]
    Unset,
    Equal,
    Greater,
    Less,
}

impl Comparator {
    /// Compare `lhs` against `rhs`.
    pub fn compare(lhs: i32, rhs: i32) -> Self {
        Self::from(lhs.cmp(&rhs))
    }
}

impl From<Ordering> for Comparator {
    fn from(ord: Ordering) -> Self {
        match ord {
            Ordering::Equal => Comparator::Equal,
            Ordering::Greater => Comparator::Greater,
            Ordering::Less => Comparator::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Comparator::Unset => "unset",
            Comparator::Equal => "equal",
            Comparator::Greater => "greater",
            Comparator::Less => "less",
        };
        f.write_str(name)
    }
}
