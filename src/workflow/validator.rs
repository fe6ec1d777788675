//! Request Validation
//!
//! Checks a [`WorkflowRequest`] before it is normalized and injected:
//! - Destination site is a known site
//! - A lumi mask is only combined with lumi-based splitting
//! - Schema fields are present and well formed
//! - Site lists reference known sites or wildcard keys

use std::collections::HashSet;

use log::{debug, info, warn};

use super::model::{SplitAlgorithm, WorkflowRequest};
use crate::sites::SiteWildcardMap;

/// Validation failures with user-facing messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    UnknownDestination(String),
    LumiMaskWithoutLumiSplitting(SplitAlgorithm),
    EmptyWorkflowName,
    InvalidWorkflowName(String),
    EmptyUsername,
    InvalidUsername(String),
    EmptySoftwareVersion,
    EmptyArchitecture,
    InvalidDataset(String),
    ZeroSplitArgument(SplitAlgorithm),
    UnknownSite { list: &'static str, site: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDestination(site) => write!(
                f,
                "The parameter asyncdest {} is not in the list of known CMS sites",
                site
            ),
            Self::LumiMaskWithoutLumiSplitting(algo) => write!(
                f,
                "You must use LumiBased splitting if specifying a lumiMask (got {})",
                algo
            ),
            Self::EmptyWorkflowName => write!(f, "Workflow name is empty"),
            Self::InvalidWorkflowName(name) => write!(
                f,
                "Workflow name '{}' may only contain letters, digits, '-' and '_'",
                name
            ),
            Self::EmptyUsername => write!(f, "Username is empty"),
            Self::InvalidUsername(name) => write!(
                f,
                "Username '{}' may only contain letters, digits, '-' and '_'",
                name
            ),
            Self::EmptySoftwareVersion => write!(f, "Software version is not specified"),
            Self::EmptyArchitecture => write!(f, "Software architecture is not specified"),
            Self::InvalidDataset(dataset) => write!(
                f,
                "Input dataset '{}' is not of the form /primary/processed/tier",
                dataset
            ),
            Self::ZeroSplitArgument(algo) => {
                write!(f, "{} must be greater than zero", algo.argument_key())
            }
            Self::UnknownSite { list, site } => {
                write!(f, "Site '{}' in {} is not a known site or wildcard", site, list)
            }
        }
    }
}

/// Checks that the destination site is a known site.
pub fn check_destination(
    request: &WorkflowRequest,
    known_sites: &HashSet<String>,
) -> Result<(), ValidationError> {
    if known_sites.contains(&request.destination_site) {
        Ok(())
    } else {
        Err(ValidationError::UnknownDestination(request.destination_site.clone()))
    }
}

/// Checks that a lumi mask is only used with lumi-based splitting.
pub fn check_lumi_mask(request: &WorkflowRequest) -> Result<(), ValidationError> {
    if request.has_lumi_mask() && request.split_algorithm != SplitAlgorithm::LumiBased {
        return Err(ValidationError::LumiMaskWithoutLumiSplitting(request.split_algorithm));
    }
    Ok(())
}

/// Names become part of request names and document file names.
fn is_valid_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_dataset(dataset: &str) -> bool {
    let Some(rest) = dataset.strip_prefix('/') else {
        return false;
    };
    let parts: Vec<&str> = rest.split('/').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.trim().is_empty())
}

/// Validates the request schema.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_schema(
    request: &WorkflowRequest,
    known_sites: &HashSet<String>,
    wildcards: &SiteWildcardMap,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if request.name.trim().is_empty() {
        errors.push(ValidationError::EmptyWorkflowName);
    } else if !is_valid_name(&request.name) {
        errors.push(ValidationError::InvalidWorkflowName(request.name.clone()));
    }

    if request.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    } else if !is_valid_name(&request.username) {
        errors.push(ValidationError::InvalidUsername(request.username.clone()));
    }

    if request.software_version.trim().is_empty() {
        errors.push(ValidationError::EmptySoftwareVersion);
    }

    if request.architecture.trim().is_empty() {
        errors.push(ValidationError::EmptyArchitecture);
    }

    if !is_valid_dataset(&request.input_dataset) {
        errors.push(ValidationError::InvalidDataset(request.input_dataset.clone()));
    }

    if request.split_argument == 0 {
        errors.push(ValidationError::ZeroSplitArgument(request.split_algorithm));
    }

    let site_lists = [
        ("site whitelist", &request.site_whitelist),
        ("site blacklist", &request.site_blacklist),
    ];
    for (list, sites) in site_lists {
        for site in sites {
            if !known_sites.contains(site) && !wildcards.is_wildcard(site) {
                errors.push(ValidationError::UnknownSite {
                    list,
                    site: site.clone(),
                });
            }
        }
    }

    if request.config_doc.trim().is_empty() {
        warn!("Request '{}' has no configuration document", request.name);
    }

    if errors.is_empty() {
        debug!("Request '{}' passed schema validation", request.name);
    }

    errors
}

/// Runs every check and returns the messages, for client-side feedback.
pub fn quick_validate(
    request: &WorkflowRequest,
    known_sites: &HashSet<String>,
    wildcards: &SiteWildcardMap,
) -> Vec<String> {
    let mut errors = Vec::new();

    if let Err(e) = check_destination(request, known_sites) {
        errors.push(e.to_string());
    }
    if let Err(e) = check_lumi_mask(request) {
        errors.push(e.to_string());
    }
    errors.extend(
        validate_schema(request, known_sites, wildcards)
            .iter()
            .map(ValidationError::to_string),
    );

    info!("Request '{}': {} validation problems", request.name, errors.len());
    errors
}
