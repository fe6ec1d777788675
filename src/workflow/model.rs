//! Workflow Request Model
//!
//! The user-facing description of an analysis workflow, as handed to
//! [`DataWorkflow::submit`](super::DataWorkflow::submit).
//!
//! # Example
//!
//! ```
//! use crabinterface::workflow::{SplitAlgorithm, WorkflowRequest};
//!
//! let request = WorkflowRequest::new(
//!     "ttbar_analysis",
//!     "jdoe",
//!     "/GenericTTbar/HC-CMSSW_5_3_1_START53_V5-v1/GEN-SIM-RECO",
//!     "T2_IT_Legnaro",
//! )
//! .with_software("CMSSW_5_3_4", "slc5_amd64_gcc462")
//! .with_splitting(SplitAlgorithm::LumiBased, 20)
//! .with_site_blacklist(vec!["T1*".to_string()]);
//!
//! assert_eq!(request.split_algorithm.argument_key(), "lumis_per_job");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::runs::RunRange;

/// Policy used to partition the input dataset into jobs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitAlgorithm {
    LumiBased,
    EventBased,
    FileBased,
}

impl SplitAlgorithm {
    /// All recognized algorithms.
    pub const ALL: [SplitAlgorithm; 3] = [Self::LumiBased, Self::EventBased, Self::FileBased];

    /// Name of the splitting argument understood by the request manager.
    pub fn argument_key(&self) -> &'static str {
        match self {
            Self::LumiBased => "lumis_per_job",
            Self::EventBased => "events_per_job",
            Self::FileBased => "files_per_job",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LumiBased => "LumiBased",
            Self::EventBased => "EventBased",
            Self::FileBased => "FileBased",
        }
    }
}

impl fmt::Display for SplitAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "Unknown splitting algorithm '{}' (expected one of LumiBased, EventBased, FileBased)",
                    s
                )
            })
    }
}

/// Accepted luminosity-block ranges, per run.
///
/// Serialized the way lumi-mask files are written:
/// `{"1": [[1, 10], [15, 20]], "2": [[3, 3]]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct LumiMask {
    runs: BTreeMap<u64, Vec<[u64; 2]>>,
}

impl LumiMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inclusive lumi range for a run.
    pub fn add_range(&mut self, run: u64, first: u64, last: u64) {
        self.runs.entry(run).or_default().push([first, last]);
    }

    /// Builder form of [`add_range`](Self::add_range).
    pub fn with_range(mut self, run: u64, first: u64, last: u64) -> Self {
        self.add_range(run, first, last);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.runs.values().all(Vec::is_empty)
    }

    /// Iterates `(run, [first, last])` pairs in run order.
    pub fn ranges(&self) -> impl Iterator<Item = (u64, [u64; 2])> + '_ {
        self.runs
            .iter()
            .flat_map(|(run, ranges)| ranges.iter().map(move |range| (*run, *range)))
    }

    /// Runs covered by the mask.
    pub fn run_numbers(&self) -> Vec<u64> {
        self.runs.keys().copied().collect()
    }

    /// Renders the mask as `run:first-run:last` strings.
    pub fn lumis_to_process(&self) -> Vec<String> {
        self.ranges()
            .map(|(run, [first, last])| format!("{}:{}-{}:{}", run, first, run, last))
            .collect()
    }
}

/// A workflow submission request.
///
/// Built per submission call and not modified once handed to the façade.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkflowRequest {
    /// Workflow name chosen by the user
    pub name: String,

    /// Job type, usually "Analysis"
    #[serde(default = "default_job_type")]
    pub job_type: String,

    /// Distinguished name of the submitting user
    #[serde(default)]
    pub user_dn: String,

    /// Username of the submitting user
    pub username: String,

    /// Software release (CMSSW version)
    #[serde(default)]
    pub software_version: String,

    /// Software architecture (SCRAM_ARCH)
    #[serde(default)]
    pub architecture: String,

    /// Input dataset path
    pub input_dataset: String,

    /// Sites allowed to run jobs; entries may be wildcard keys
    #[serde(default)]
    pub site_whitelist: Vec<String>,

    /// Sites excluded from running jobs; entries may be wildcard keys
    #[serde(default)]
    pub site_blacklist: Vec<String>,

    #[serde(default)]
    pub run_whitelist: Vec<RunRange>,

    #[serde(default)]
    pub run_blacklist: Vec<RunRange>,

    #[serde(default)]
    pub block_whitelist: Vec<String>,

    #[serde(default)]
    pub block_blacklist: Vec<String>,

    pub split_algorithm: SplitAlgorithm,

    /// Algorithm-specific argument (lumis, events or files per job)
    pub split_argument: u64,

    /// Identifier of the configuration document in the config cache
    #[serde(default)]
    pub config_doc: String,

    /// URL of the user input sandbox
    #[serde(default)]
    pub user_sandbox: Option<String>,

    /// Additional input files shipped with the job
    #[serde(default)]
    pub user_files: Vec<String>,

    /// Additional output files produced by the job
    #[serde(default)]
    pub output_files: Vec<String>,

    #[serde(default)]
    pub save_logs: bool,

    /// Dataset name used for publication; publication is off when absent
    #[serde(default)]
    pub publish_name: Option<String>,

    /// Storage site receiving the output files
    pub destination_site: String,

    /// Existing campaign to append to; defaults to the request name
    #[serde(default)]
    pub campaign: Option<String>,

    #[serde(default)]
    pub lumi_mask: Option<LumiMask>,

    /// Set by the client when the user lacks T1 access
    #[serde(default)]
    pub blacklist_t1: bool,
}

fn default_job_type() -> String {
    "Analysis".to_string()
}

impl WorkflowRequest {
    /// Creates a request with the mandatory fields and file-based splitting
    /// of one file per job.
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        input_dataset: impl Into<String>,
        destination_site: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            job_type: default_job_type(),
            user_dn: String::new(),
            username: username.into().trim().to_string(),
            software_version: String::new(),
            architecture: String::new(),
            input_dataset: input_dataset.into().trim().to_string(),
            site_whitelist: Vec::new(),
            site_blacklist: Vec::new(),
            run_whitelist: Vec::new(),
            run_blacklist: Vec::new(),
            block_whitelist: Vec::new(),
            block_blacklist: Vec::new(),
            split_algorithm: SplitAlgorithm::FileBased,
            split_argument: 1,
            config_doc: String::new(),
            user_sandbox: None,
            user_files: Vec::new(),
            output_files: Vec::new(),
            save_logs: false,
            publish_name: None,
            destination_site: destination_site.into().trim().to_string(),
            campaign: None,
            lumi_mask: None,
            blacklist_t1: false,
        }
    }

    pub fn with_user_dn(mut self, dn: impl Into<String>) -> Self {
        self.user_dn = dn.into();
        self
    }

    /// Sets the software release and architecture.
    pub fn with_software(mut self, version: impl Into<String>, arch: impl Into<String>) -> Self {
        self.software_version = version.into();
        self.architecture = arch.into();
        self
    }

    pub fn with_splitting(mut self, algorithm: SplitAlgorithm, argument: u64) -> Self {
        self.split_algorithm = algorithm;
        self.split_argument = argument;
        self
    }

    pub fn with_site_whitelist(mut self, sites: Vec<String>) -> Self {
        self.site_whitelist = sites;
        self
    }

    pub fn with_site_blacklist(mut self, sites: Vec<String>) -> Self {
        self.site_blacklist = sites;
        self
    }

    pub fn with_run_whitelist(mut self, runs: Vec<RunRange>) -> Self {
        self.run_whitelist = runs;
        self
    }

    pub fn with_run_blacklist(mut self, runs: Vec<RunRange>) -> Self {
        self.run_blacklist = runs;
        self
    }

    pub fn with_lumi_mask(mut self, mask: LumiMask) -> Self {
        self.lumi_mask = Some(mask);
        self
    }

    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = Some(campaign.into());
        self
    }

    pub fn with_output_files(mut self, files: Vec<String>) -> Self {
        self.output_files = files;
        self
    }

    pub fn with_publication(mut self, publish_name: impl Into<String>) -> Self {
        self.publish_name = Some(publish_name.into());
        self
    }

    /// Requests that T1 sites be blacklisted.
    pub fn blacklisting_t1(mut self) -> Self {
        self.blacklist_t1 = true;
        self
    }

    /// Returns true if a non-empty lumi mask is attached.
    pub fn has_lumi_mask(&self) -> bool {
        self.lumi_mask.as_ref().is_some_and(|mask| !mask.is_empty())
    }
}
