//! Request Manager
//!
//! Owns the lifecycle of injected requests. A newly checked-in request is
//! `new`; the façade moves it to `assignment-approved` and then assigns it
//! to a team.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::RequestRecord;

/// Lifecycle states tracked by the request manager.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    New,
    AssignmentApproved,
    Assigned,
}

impl RequestStatus {
    /// Returns true if `next` may follow this state.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::AssignmentApproved) | (Self::AssignmentApproved, Self::Assigned)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::AssignmentApproved => "assignment-approved",
            Self::Assigned => "assigned",
        };
        f.write_str(name)
    }
}

/// Errors raised by the request manager.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("request check-in failed: {0}")]
    CheckIn(String),

    #[error("unknown request '{0}'")]
    UnknownRequest(String),

    #[error("cannot change request '{name}' from {from} to {to}")]
    InvalidTransition {
        name: String,
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("failed to persist request states: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt request state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request lifecycle operations used at injection time.
pub trait RequestManager {
    /// Registers a new request in state `new`.
    fn check_in(&mut self, record: &RequestRecord) -> Result<(), ManagerError>;

    /// Moves a request to another state.
    fn change_status(&mut self, request_name: &str, status: RequestStatus) -> Result<(), ManagerError>;

    /// Assigns an approved request to a team.
    fn assign(&mut self, request_name: &str, team: &str) -> Result<(), ManagerError>;

    /// Current state of a request.
    fn status(&self, request_name: &str) -> Option<RequestStatus>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct TrackedRequest {
    status: RequestStatus,
    team: Option<String>,
}

/// Request manager tracking states locally, optionally persisted to JSON.
#[derive(Debug, Clone, Default)]
pub struct LocalRequestManager {
    requests: BTreeMap<String, TrackedRequest>,
    path: Option<PathBuf>,
}

impl LocalRequestManager {
    /// Creates a manager that keeps states in memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a manager persisting states to `path`, loading existing ones.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ManagerError> {
        let path = path.into();
        let requests = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        info!("Loaded {} request states from {}", requests.len(), path.display());
        Ok(Self {
            requests,
            path: Some(path),
        })
    }

    /// Team a request was assigned to.
    pub fn team(&self, request_name: &str) -> Option<&str> {
        self.requests
            .get(request_name)
            .and_then(|r| r.team.as_deref())
    }

    fn persist(&self) -> Result<(), ManagerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.requests)?)?;
        Ok(())
    }

    fn transition(&mut self, request_name: &str, to: RequestStatus) -> Result<&mut TrackedRequest, ManagerError> {
        let tracked = self
            .requests
            .get_mut(request_name)
            .ok_or_else(|| ManagerError::UnknownRequest(request_name.to_string()))?;

        if !tracked.status.can_transition_to(to) {
            return Err(ManagerError::InvalidTransition {
                name: request_name.to_string(),
                from: tracked.status,
                to,
            });
        }

        debug!("Request '{}': {} -> {}", request_name, tracked.status, to);
        tracked.status = to;
        Ok(tracked)
    }
}

impl RequestManager for LocalRequestManager {
    fn check_in(&mut self, record: &RequestRecord) -> Result<(), ManagerError> {
        if self.requests.contains_key(&record.request_name) {
            return Err(ManagerError::CheckIn(format!(
                "request '{}' is already checked in",
                record.request_name
            )));
        }
        if record.input_dataset.is_empty() {
            return Err(ManagerError::CheckIn(format!(
                "request '{}' has no input dataset",
                record.request_name
            )));
        }

        self.requests.insert(
            record.request_name.clone(),
            TrackedRequest {
                status: RequestStatus::New,
                team: None,
            },
        );
        info!("Checked in request '{}'", record.request_name);
        self.persist()
    }

    fn change_status(&mut self, request_name: &str, status: RequestStatus) -> Result<(), ManagerError> {
        self.transition(request_name, status)?;
        self.persist()
    }

    fn assign(&mut self, request_name: &str, team: &str) -> Result<(), ManagerError> {
        let tracked = self.transition(request_name, RequestStatus::Assigned)?;
        tracked.team = Some(team.to_string());
        info!("Assigned request '{}' to team '{}'", request_name, team);
        self.persist()
    }

    fn status(&self, request_name: &str) -> Option<RequestStatus> {
        self.requests.get(request_name).map(|r| r.status)
    }
}
