//! Run Number Ranges
//!
//! Run whitelists and blacklists are given as inclusive ranges
//! (`"1-10"`, `"42"`) and handed to the request manager as explicit lists.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An inclusive range of run numbers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRange {
    pub first: u64,
    pub last: u64,
}

impl RunRange {
    /// Creates a range; bounds may be given in either order.
    pub fn new(a: u64, b: u64) -> Self {
        Self {
            first: a.min(b),
            last: a.max(b),
        }
    }

    /// A range covering a single run.
    pub fn single(run: u64) -> Self {
        Self::new(run, run)
    }

    /// Iterates over every run in the range.
    pub fn runs(&self) -> impl Iterator<Item = u64> {
        self.first..=self.last
    }
}

impl fmt::Display for RunRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

impl FromStr for RunRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| format!("Invalid run number '{}' in '{}'", part.trim(), s))
        };

        match s.split_once('-') {
            Some((a, b)) => Ok(Self::new(parse(a)?, parse(b)?)),
            None => Ok(Self::single(parse(s)?)),
        }
    }
}

/// Parses a comma-separated list of run ranges such as `"1-3,7,10-12"`.
pub fn parse_run_ranges(list: &str) -> Result<Vec<RunRange>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(RunRange::from_str)
        .collect()
}

/// Expands ranges into a sorted list holding every covered run exactly once.
///
/// # Example
/// ```
/// use crabinterface::workflow::runs::{expand_ranges, RunRange};
///
/// let runs = expand_ranges(&[RunRange::new(5, 3), RunRange::single(4), RunRange::single(9)]);
/// assert_eq!(runs, vec![3, 4, 5, 9]);
/// ```
pub fn expand_ranges(ranges: &[RunRange]) -> Vec<u64> {
    let runs: BTreeSet<u64> = ranges.iter().flat_map(RunRange::runs).collect();
    runs.into_iter().collect()
}
