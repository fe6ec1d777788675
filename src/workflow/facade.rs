//! Workflow Façade
//!
//! Entry point for workflow operations. Submission validates a request,
//! normalizes it into a [`RequestRecord`], persists it and injects it into
//! the request manager.
//!
//! Collaborators are injected at construction; the site cache is built
//! once there and never refreshed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::model::WorkflowRequest;
use super::record::{request_name, RequestRecord, T1_SITE_PATTERN, T1_WILDCARD};
use super::validator::{check_destination, check_lumi_mask, quick_validate, validate_schema};
use crate::config::ServiceConfig;
use crate::sites::{SiteCatalog, SiteWildcardMap};
use crate::store::{ManagerError, RequestManager, RequestStatus, RequestStore};
use crate::users::{ensure_user, UserRegistry};

/// Result of a successful submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    #[serde(rename = "RequestName")]
    pub request_name: String,
}

/// Operations on workflow resources.
pub struct DataWorkflow {
    config: ServiceConfig,
    users: Box<dyn UserRegistry>,
    store: Box<dyn RequestStore>,
    manager: Box<dyn RequestManager>,
    known_sites: Vec<String>,
    known_site_set: HashSet<String>,
    wildcards: SiteWildcardMap,
}

impl DataWorkflow {
    /// Creates the façade and builds the site cache from the catalog.
    ///
    /// The T1 wildcard is always resolvable, so the T1 blacklist override
    /// blacklists real sites whatever the configured wildcard keys.
    pub fn new(
        mut config: ServiceConfig,
        catalog: &dyn SiteCatalog,
        users: Box<dyn UserRegistry>,
        store: Box<dyn RequestStore>,
        manager: Box<dyn RequestManager>,
    ) -> Result<Self> {
        if !config.site_wildcards.contains_key(T1_WILDCARD) {
            warn!("No '{}' site wildcard configured, using '{}'", T1_WILDCARD, T1_SITE_PATTERN);
            config
                .site_wildcards
                .insert(T1_WILDCARD.to_string(), T1_SITE_PATTERN.to_string());
        }

        let known_sites = catalog.all_site_names()?;
        let wildcards = SiteWildcardMap::build(&config.site_wildcards, &known_sites)?;
        let known_site_set = known_sites.iter().cloned().collect();

        info!(
            "Workflow façade ready: {} known sites, {} wildcard keys",
            known_sites.len(),
            config.site_wildcards.len()
        );

        Ok(Self {
            config,
            users,
            store,
            manager,
            known_sites,
            known_site_set,
            wildcards,
        })
    }

    /// Known site names, in catalog order.
    pub fn known_sites(&self) -> &[String] {
        &self.known_sites
    }

    pub fn wildcards(&self) -> &SiteWildcardMap {
        &self.wildcards
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Submits a workflow, naming it after the current time.
    pub fn submit(&mut self, request: &WorkflowRequest) -> Result<Vec<SubmitResult>> {
        self.submit_at(request, Utc::now())
    }

    /// Submits a workflow as if requested at `at`.
    ///
    /// Returns a single-element list holding the generated request name.
    pub fn submit_at(&mut self, request: &WorkflowRequest, at: DateTime<Utc>) -> Result<Vec<SubmitResult>> {
        info!(
            "Submitting workflow '{}' for user '{}'",
            request.name, request.username
        );

        ensure_user(self.users.as_mut(), &request.user_dn, &request.username)?;

        let name = request_name(&request.username, &request.name, at);

        check_destination(request, &self.known_site_set).map_err(invalid)?;

        let mut record = RequestRecord::from_request(request, name, at, &self.config);
        let previous = self.store.count_campaign(&record.campaign)?;
        record.processing_version = u32::try_from(previous + 1).unwrap_or(u32::MAX);

        check_lumi_mask(request).map_err(invalid)?;

        let errors = validate_schema(request, &self.known_site_set, &self.wildcards);
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(Error::InvalidParameter(messages.join("; ")));
        }

        if request.blacklist_t1 {
            debug!("Blacklisting T1 sites for '{}'", record.request_name);
            record.blacklist_t1();
        }

        record.annotate_sites(&self.wildcards);
        self.store.insert(&record)?;

        self.inject(&record)?;

        info!("Workflow '{}' submitted as '{}'", request.name, record.request_name);
        Ok(vec![SubmitResult {
            request_name: record.request_name,
        }])
    }

    /// Checks the request in, approves it and assigns it to the team.
    fn inject(&mut self, record: &RequestRecord) -> Result<()> {
        inject_steps(self.manager.as_mut(), record).map_err(|e| {
            error!("Injection of '{}' failed: {}", record.request_name, e);
            Error::ExecutionError(e.to_string())
        })
    }

    /// Stored records for the given request names.
    pub fn get_all(&self, names: &[String]) -> Result<Vec<Option<RequestRecord>>> {
        names
            .iter()
            .map(|name| self.store.get(name).map_err(Error::from))
            .collect()
    }

    /// Problems `submit` would reject the request for, as messages.
    ///
    /// Nothing is registered, stored or injected.
    pub fn validate(&self, request: &WorkflowRequest) -> Vec<String> {
        quick_validate(request, &self.known_site_set, &self.wildcards)
    }

    /// Lifecycle state of a request, as known to the request manager.
    pub fn status(&self, request_name: &str) -> Option<RequestStatus> {
        self.manager.status(request_name)
    }

    pub fn resubmit(&mut self, _workflow: &str) -> Result<()> {
        Err(Error::Unimplemented("resubmit"))
    }

    pub fn kill(&mut self, _workflow: &str, _force: bool) -> Result<()> {
        Err(Error::Unimplemented("kill"))
    }

    pub fn report(&self, _workflow: &str) -> Result<()> {
        Err(Error::Unimplemented("report"))
    }

    pub fn logs(&self, _workflow: &str, _limit: usize) -> Result<()> {
        Err(Error::Unimplemented("logs"))
    }

    pub fn output(&self, _workflow: &str, _limit: usize) -> Result<()> {
        Err(Error::Unimplemented("output"))
    }

    pub fn schema(&self, _workflow: &str) -> Result<()> {
        Err(Error::Unimplemented("schema"))
    }

    pub fn configcache(&self, _workflow: &str) -> Result<()> {
        Err(Error::Unimplemented("configcache"))
    }

    pub fn publish(&mut self, _workflow: &str, _dbs_url: &str) -> Result<()> {
        Err(Error::Unimplemented("publish"))
    }
}

fn inject_steps(manager: &mut dyn RequestManager, record: &RequestRecord) -> std::result::Result<(), ManagerError> {
    manager.check_in(record)?;
    manager.change_status(&record.request_name, RequestStatus::AssignmentApproved)?;
    manager.assign(&record.request_name, &record.team)?;
    Ok(())
}

fn invalid(e: impl ToString) -> Error {
    Error::InvalidParameter(e.to_string())
}
