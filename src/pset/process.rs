//! Processing Configuration
//!
//! Every parameter of the job-processing configuration that the setup step
//! may touch, stored as JSON in the job working directory.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "source": { "fileNames": [], "firstRun": 1 },
//!   "maxEvents": { "input": -1 },
//!   "outputModules": { "o": { "fileName": "o.root" } },
//!   "randomNumberGeneratorService": {
//!     "generator": { "initialSeed": 123456789 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::TweakError;

/// Input source parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default)]
    pub file_names: Vec<String>,
    #[serde(default)]
    pub secondary_file_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_event: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_events: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_run: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_luminosity_block: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lumis_to_process: Vec<String>,
}

/// Event limit; -1 processes every event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MaxEvents {
    pub input: i64,
}

impl Default for MaxEvents {
    fn default() -> Self {
        Self { input: -1 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputModule {
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_file_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RandomEngine {
    pub initial_seed: u32,
}

/// The job-processing configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessConfig {
    #[serde(default)]
    pub source: Source,

    #[serde(default)]
    pub max_events: MaxEvents,

    /// Output modules by name
    #[serde(default)]
    pub output_modules: BTreeMap<String, OutputModule>,

    /// Random engines by name; absent when the job draws no random numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_number_generator_service: Option<BTreeMap<String, RandomEngine>>,
}

impl ProcessConfig {
    /// Reads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TweakError> {
        let content = fs::read_to_string(path).map_err(|source| TweakError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: ProcessConfig = serde_json::from_str(&content)?;
        debug!(
            "Loaded process configuration with {} output modules",
            config.output_modules.len()
        );
        Ok(config)
    }

    /// Writes the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), TweakError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| TweakError::Io {
            path: path.display().to_string(),
            source,
        })?;

        info!("Wrote process configuration to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: ProcessConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.max_events.input, -1);
        assert!(config.source.file_names.is_empty());
        assert!(config.random_number_generator_service.is_none());
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("PSet.json");
        fs::write(
            &path,
            r#"{"source": {"firstRun": 3}, "randomNumberGeneratorService": {"generator": {"initialSeed": 42}}}"#,
        )
        .unwrap();

        let mut config = ProcessConfig::load(&path).unwrap();
        assert_eq!(config.source.first_run, Some(3));

        config.max_events.input = 10;
        let out = dir.path().join("out.json");
        config.save(&out).unwrap();

        assert_eq!(ProcessConfig::load(&out).unwrap(), config);
    }

    #[test]
    fn test_load_missing() {
        let result = ProcessConfig::load(Path::new("/nonexistent/PSet.json"));
        assert!(matches!(result, Err(TweakError::Io { .. })));
    }

    #[test]
    fn test_load_unknown_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("PSet.json");
        fs::write(&path, r#"{"maxEvents": {"input": "all"}}"#).unwrap();

        assert!(matches!(ProcessConfig::load(&path), Err(TweakError::Json(_))));
    }
}
