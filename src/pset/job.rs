//! Per-Job Inputs
//!
//! The values assigned to a single job: its input files, the event and
//! luminosity mask, and the seeding policy for Monte Carlo production.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::workflow::LumiMask;

/// Prefix of placeholder input files used by Monte Carlo jobs.
pub const MC_FAKE_FILE_PREFIX: &str = "MCFakeFile";

/// An input file and the parent files it was derived from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InputFileDescriptor {
    /// Logical file name
    pub lfn: String,

    /// Logical file names of the parents
    #[serde(default)]
    pub parents: Vec<String>,
}

impl InputFileDescriptor {
    pub fn new(lfn: impl Into<String>) -> Self {
        Self {
            lfn: lfn.into(),
            parents: Vec::new(),
        }
    }

    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parents = parents;
        self
    }

    /// Returns true for Monte Carlo placeholder files.
    pub fn is_placeholder(&self) -> bool {
        self.lfn.starts_with(MC_FAKE_FILE_PREFIX)
    }
}

/// Event, run and lumi restrictions of a single job.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JobMask {
    pub first_event: Option<u64>,
    pub last_event: Option<u64>,
    pub first_run: Option<u64>,
    pub first_lumi: Option<u64>,
    #[serde(default)]
    pub run_and_lumis: LumiMask,
}

impl JobMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, first: u64, last: u64) -> Self {
        self.first_event = Some(first);
        self.last_event = Some(last);
        self
    }

    pub fn with_first_event(mut self, first: u64) -> Self {
        self.first_event = Some(first);
        self
    }

    pub fn with_first_run(mut self, run: u64) -> Self {
        self.first_run = Some(run);
        self
    }

    pub fn with_first_lumi(mut self, lumi: u64) -> Self {
        self.first_lumi = Some(lumi);
        self
    }

    pub fn with_run_and_lumis(mut self, lumis: LumiMask) -> Self {
        self.run_and_lumis = lumis;
        self
    }

    /// Number of events to process, if both event bounds are known.
    pub fn max_events(&self) -> Option<u64> {
        match (self.first_event, self.last_event) {
            (Some(first), Some(last)) if last >= first => Some(last - first + 1),
            _ => None,
        }
    }
}

/// Random number seeding policy for Monte Carlo jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seeding {
    /// Keep the seeds written in the configuration
    Reproducible,
    /// Draw fresh seeds; carries the policy name as given
    Automatic(String),
}

impl FromStr for Seeding {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "ReproducibleSeeding" => Self::Reproducible,
            other => Self::Automatic(other.to_string()),
        })
    }
}

impl fmt::Display for Seeding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reproducible => f.write_str("ReproducibleSeeding"),
            Self::Automatic(name) => f.write_str(name),
        }
    }
}
