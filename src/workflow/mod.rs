//! Workflow Submission Module
//!
//! Provides the workflow request model, its validation and normalization,
//! and the façade that injects requests into the request manager.
//!
//! # Structure
//!
//! - [`model`]: Request data structures (WorkflowRequest, SplitAlgorithm, LumiMask)
//! - [`runs`]: Run number ranges and their expansion
//! - [`record`]: Normalized request record persisted to the document store
//! - [`validator`]: Precondition and schema checks
//! - [`parser`]: Submission file loading
//! - [`facade`]: Submission and the remaining workflow operations

pub mod error;
pub mod facade;
pub mod model;
pub mod parser;
pub mod record;
pub mod runs;
pub mod validator;

pub use error::{Error, Result};
pub use facade::{DataWorkflow, SubmitResult};
pub use model::{LumiMask, SplitAlgorithm, WorkflowRequest};
pub use parser::load_request;
pub use record::RequestRecord;
pub use runs::{expand_ranges, RunRange};
