//! Job Configuration Tweaking
//!
//! Materializes per-job parameters (input files, event and lumi masks,
//! output file names, random seeds) into the job-processing configuration
//! before the main processing step runs.
//!
//! # Components
//!
//! - [`job`]: Per-job inputs (JobMask, InputFileDescriptor, Seeding)
//! - [`process`]: The processing configuration record
//! - [`tweak`]: The tweak itself and the one-shot setup procedure
//! - [`args`]: Decoding of command-line arguments

pub mod args;
pub mod job;
pub mod process;
pub mod tweak;

use thiserror::Error;

pub use args::{decode_positional, parse_literal, JobMode, TweakArguments};
pub use job::{InputFileDescriptor, JobMask, Seeding};
pub use process::ProcessConfig;
pub use tweak::{setup_pset, PsetTweak, PSET_INPUT, PSET_OUTPUT};

/// Fatal errors of the job setup step.
#[derive(Error, Debug)]
pub enum TweakError {
    #[error("no first lumi information provided in the mask for placeholder input file '{0}'")]
    MissingFirstLumi(String),

    #[error("no first event information provided in the mask for a job without input files")]
    MissingFirstEvent,

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid {name} '{value}': {reason}")]
    BadArgument {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid process configuration: {0}")]
    Json(#[from] serde_json::Error),
}
