//! Submission File Parser
//!
//! Loads a user-side submission file and turns it into a
//! [`WorkflowRequest`].
//!
//! # Example YAML Format
//!
//! ```yaml
//! General:
//!   requestName: ttbar_lumis
//!   saveLogs: true
//! JobType:
//!   pluginName: Analysis
//!   psetName: pset_tfile_config
//!   softwareVersion: CMSSW_5_3_4
//!   scramArch: slc5_amd64_gcc462
//! Data:
//!   inputDataset: /GenericTTbar/HC-CMSSW_5_3_1_START53_V5-v1/GEN-SIM-RECO
//!   splitting: LumiBased
//!   unitsPerJob: 20
//!   lumiMask: lumimask/GenericTTbar_File1_lumimask.json
//!   runRange: 1-10,15
//!   publication: true
//!   publishDataName: ttbar_skim
//! Site:
//!   storageSite: T2_IT_Legnaro
//!   blacklist: [T1*]
//! ```

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;

use super::model::{LumiMask, SplitAlgorithm, WorkflowRequest};
use super::runs::parse_run_ranges;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeneralSection {
    request_name: String,
    #[serde(default)]
    save_logs: bool,
    #[serde(default)]
    campaign: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JobTypeSection {
    #[serde(default = "default_plugin")]
    plugin_name: String,
    #[serde(default)]
    pset_name: String,
    #[serde(default)]
    software_version: Option<String>,
    #[serde(default)]
    scram_arch: Option<String>,
    #[serde(default)]
    input_files: Vec<String>,
    #[serde(default)]
    output_files: Vec<String>,
    #[serde(default)]
    sandbox_url: Option<String>,
}

fn default_plugin() -> String {
    "Analysis".to_string()
}

impl Default for JobTypeSection {
    fn default() -> Self {
        Self {
            plugin_name: default_plugin(),
            pset_name: String::new(),
            software_version: None,
            scram_arch: None,
            input_files: Vec::new(),
            output_files: Vec::new(),
            sandbox_url: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DataSection {
    input_dataset: String,
    splitting: String,
    units_per_job: u64,
    #[serde(default)]
    lumi_mask: Option<PathBuf>,
    #[serde(default)]
    run_range: Option<String>,
    #[serde(default)]
    run_blacklist: Option<String>,
    #[serde(default)]
    block_whitelist: Vec<String>,
    #[serde(default)]
    block_blacklist: Vec<String>,
    #[serde(default)]
    publication: bool,
    #[serde(default)]
    publish_data_name: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SiteSection {
    storage_site: String,
    #[serde(default)]
    whitelist: Vec<String>,
    #[serde(default)]
    blacklist: Vec<String>,
}

/// Top level of a submission file.
#[derive(Deserialize, Debug)]
struct SubmissionFile {
    #[serde(rename = "General")]
    general: GeneralSection,
    #[serde(rename = "JobType", default)]
    job_type: JobTypeSection,
    #[serde(rename = "Data")]
    data: DataSection,
    #[serde(rename = "Site")]
    site: SiteSection,
}

/// Loads a submission file into a request for `username`.
///
/// Relative lumi-mask paths are resolved against the submission file's
/// directory. Software version and architecture fall back to the
/// `CMSSW_VERSION` and `SCRAM_ARCH` environment variables.
///
/// # Example
///
/// ```rust,no_run
/// use crabinterface::workflow::load_request;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let request = load_request("crab_ttbar.yaml", "jdoe")?;
///     println!("Loaded request {}", request.name);
///     Ok(())
/// }
/// ```
pub fn load_request(path: &str, username: &str) -> Result<WorkflowRequest, Box<dyn Error>> {
    info!("Loading submission file: {}", path);

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read submission file '{}': {}. Check that the file exists and is readable.",
            path, e
        )
    })?;

    let base_dir = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    parse_request(&yaml_content, username, base_dir)
}

/// Parses submission YAML; `base_dir` anchors relative lumi-mask paths.
pub fn parse_request(
    yaml_content: &str,
    username: &str,
    base_dir: &Path,
) -> Result<WorkflowRequest, Box<dyn Error>> {
    let file: SubmissionFile = serde_yaml::from_str(yaml_content).map_err(|e| {
        format!("Failed to parse submission file: {}. Check the file format.", e)
    })?;

    let algorithm: SplitAlgorithm = file.data.splitting.parse()?;

    let mut request = WorkflowRequest::new(
        file.general.request_name,
        username,
        file.data.input_dataset,
        file.site.storage_site,
    )
    .with_splitting(algorithm, file.data.units_per_job)
    .with_site_whitelist(file.site.whitelist)
    .with_site_blacklist(file.site.blacklist)
    .with_output_files(file.job_type.output_files);

    request.job_type = file.job_type.plugin_name;
    request.config_doc = file.job_type.pset_name;
    request.user_files = file.job_type.input_files;
    request.user_sandbox = file.job_type.sandbox_url;
    request.save_logs = file.general.save_logs;
    request.campaign = file.general.campaign;
    request.block_whitelist = file.data.block_whitelist;
    request.block_blacklist = file.data.block_blacklist;

    request.software_version = file
        .job_type
        .software_version
        .or_else(|| env::var("CMSSW_VERSION").ok())
        .unwrap_or_default();
    request.architecture = file
        .job_type
        .scram_arch
        .or_else(|| env::var("SCRAM_ARCH").ok())
        .unwrap_or_default();

    if let Some(ranges) = &file.data.run_range {
        request.run_whitelist = parse_run_ranges(ranges)?;
    }
    if let Some(ranges) = &file.data.run_blacklist {
        request.run_blacklist = parse_run_ranges(ranges)?;
    }

    if let Some(mask_path) = &file.data.lumi_mask {
        request.lumi_mask = Some(load_lumi_mask(&base_dir.join(mask_path))?);
    }

    if file.data.publication {
        match file.data.publish_data_name {
            Some(name) => request.publish_name = Some(name),
            None => warn!("Publication requested but no publishDataName given; publication disabled"),
        }
    }

    debug!("Parsed request: {:?}", request);
    info!(
        "Request '{}': {} on {}, {} {}",
        request.name,
        request.job_type,
        request.input_dataset,
        request.split_argument,
        request.split_algorithm.argument_key()
    );

    Ok(request)
}

/// Reads a JSON lumi-mask file.
pub fn load_lumi_mask(path: &Path) -> Result<LumiMask, Box<dyn Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read lumi mask '{}': {}", path.display(), e))?;

    let mask: LumiMask = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse lumi mask '{}': {}", path.display(), e))?;

    info!("Loaded lumi mask covering {} runs", mask.run_numbers().len());
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::runs::RunRange;
    use tempfile::tempdir;

    const SUBMISSION: &str = r#"
General:
  requestName: ttbar_lumis
  saveLogs: true
JobType:
  pluginName: Analysis
  psetName: pset_tfile_config
  softwareVersion: CMSSW_5_3_4
  scramArch: slc5_amd64_gcc462
  outputFiles: [histos.root]
Data:
  inputDataset: /GenericTTbar/HC-CMSSW_5_3_1_START53_V5-v1/GEN-SIM-RECO
  splitting: LumiBased
  unitsPerJob: 20
  runRange: 1-3,10
  publication: true
  publishDataName: ttbar_skim
Site:
  storageSite: T2_IT_Legnaro
  blacklist: [T1*]
"#;

    #[test]
    fn test_parse_request() {
        let request = parse_request(SUBMISSION, "jdoe", Path::new(".")).unwrap();

        assert_eq!(request.name, "ttbar_lumis");
        assert_eq!(request.username, "jdoe");
        assert_eq!(request.split_algorithm, SplitAlgorithm::LumiBased);
        assert_eq!(request.split_argument, 20);
        assert_eq!(request.software_version, "CMSSW_5_3_4");
        assert_eq!(request.config_doc, "pset_tfile_config");
        assert_eq!(request.destination_site, "T2_IT_Legnaro");
        assert_eq!(request.site_blacklist, vec!["T1*"]);
        assert_eq!(request.output_files, vec!["histos.root"]);
        assert_eq!(request.run_whitelist, vec![RunRange::new(1, 3), RunRange::single(10)]);
        assert_eq!(request.publish_name.as_deref(), Some("ttbar_skim"));
        assert!(request.save_logs);
        assert!(request.lumi_mask.is_none());
    }

    #[test]
    fn test_parse_unknown_splitting() {
        let yaml = SUBMISSION.replace("splitting: LumiBased", "splitting: Automatic");
        let err = parse_request(&yaml, "jdoe", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Unknown splitting algorithm"));
    }

    #[test]
    fn test_parse_missing_section() {
        let yaml = "General:\n  requestName: x\n";
        let err = parse_request(yaml, "jdoe", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Failed to parse submission file"));
    }

    #[test]
    fn test_publication_without_name() {
        let yaml = SUBMISSION.replace("  publishDataName: ttbar_skim\n", "");
        let request = parse_request(&yaml, "jdoe", Path::new(".")).unwrap();
        assert!(request.publish_name.is_none());
    }

    #[test]
    fn test_load_request_with_lumi_mask() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lumimask")).unwrap();
        fs::write(
            dir.path().join("lumimask").join("mask.json"),
            r#"{"1": [[669684, 669684]]}"#,
        )
        .unwrap();

        let yaml = SUBMISSION.replace(
            "  unitsPerJob: 20\n",
            "  unitsPerJob: 20\n  lumiMask: lumimask/mask.json\n",
        );
        let path = dir.path().join("crab.yaml");
        fs::write(&path, yaml).unwrap();

        let request = load_request(path.to_str().unwrap(), "jdoe").unwrap();
        let mask = request.lumi_mask.unwrap();
        assert_eq!(mask.lumis_to_process(), vec!["1:669684-1:669684"]);
    }

    #[test]
    fn test_load_request_file_not_found() {
        let err = load_request("/nonexistent/crab.yaml", "jdoe").unwrap_err();
        assert!(err.to_string().contains("Failed to read submission file"));
    }

    #[test]
    fn test_load_lumi_mask_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mask.json");
        fs::write(&path, r#"{"1": [[1]]}"#).unwrap();

        assert!(load_lumi_mask(&path).is_err());
    }
}
