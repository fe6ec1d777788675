//! CRAB Interface - Grid Analysis Workflow Submission
//!
//! Server-side façade for submitting user analysis workflows to a grid
//! request manager, plus the job-side step that tweaks a job's processing
//! configuration before it runs.
//!
//! # Architecture
//!
//! - [`workflow`]: Request model, validation and the submission façade
//! - [`users`]: Registry of submitting users
//! - [`sites`]: Site catalog and wildcard resolution
//! - [`store`]: Request document store and request manager
//! - [`pset`]: Per-job configuration tweaking
//! - [`config`]: Service configuration
//! - [`logging`]: Logging setup shared by the binaries
//!
//! # Example
//!
//! ```rust,no_run
//! use crabinterface::config::ServiceConfig;
//! use crabinterface::sites::StaticCatalog;
//! use crabinterface::store::{LocalRequestManager, MemoryStore};
//! use crabinterface::users::MemoryRegistry;
//! use crabinterface::workflow::{load_request, DataWorkflow};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = StaticCatalog::new(["T2_IT_Legnaro", "T1_US_FNAL"]);
//!     let mut workflow = DataWorkflow::new(
//!         ServiceConfig::default(),
//!         &catalog,
//!         Box::new(MemoryRegistry::new()),
//!         Box::new(MemoryStore::new()),
//!         Box::new(LocalRequestManager::new()),
//!     )?;
//!
//!     let request = load_request("crab_ttbar.yaml", "jdoe")?;
//!     let result = workflow.submit(&request)?;
//!     println!("Submitted {}", result[0].request_name);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod pset;
pub mod sites;
pub mod store;
pub mod users;
pub mod workflow;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use pset::{setup_pset, PsetTweak};
pub use workflow::{load_request, DataWorkflow, WorkflowRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "CRAB Interface";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_module_exports_request() {
        let request = WorkflowRequest::new("ttbar", "jdoe", "/A/B/RECO", "T2_IT_Legnaro");
        assert_eq!(request.name, "ttbar");
        assert_eq!(request.job_type, "Analysis");
    }

    #[test]
    fn test_module_exports_tweak() {
        let tweak = PsetTweak::new(vec!["o".to_string()]);
        assert_eq!(tweak.lfn_group(), "00000");
    }
}
