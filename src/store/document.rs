//! Request Document Store
//!
//! One document per request name. Documents are written once.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::StoreError;
use crate::workflow::RequestRecord;

/// Persistent home of normalized request records.
pub trait RequestStore {
    /// Stores a new record; fails if the name is taken.
    fn insert(&mut self, record: &RequestRecord) -> Result<(), StoreError>;

    /// Loads a record by request name.
    fn get(&self, request_name: &str) -> Result<Option<RequestRecord>, StoreError>;

    /// Number of stored records belonging to a campaign.
    fn count_campaign(&self, campaign: &str) -> Result<usize, StoreError>;
}

/// Store kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, RequestRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RequestStore for MemoryStore {
    fn insert(&mut self, record: &RequestRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.request_name) {
            return Err(StoreError::AlreadyExists(record.request_name.clone()));
        }
        self.records.insert(record.request_name.clone(), record.clone());
        Ok(())
    }

    fn get(&self, request_name: &str) -> Result<Option<RequestRecord>, StoreError> {
        Ok(self.records.get(request_name).cloned())
    }

    fn count_campaign(&self, campaign: &str) -> Result<usize, StoreError> {
        Ok(self.records.values().filter(|r| r.campaign == campaign).count())
    }
}

/// Store writing `<dir>/<request_name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, request_name: &str) -> Result<PathBuf, StoreError> {
        let valid = !request_name.is_empty()
            && request_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !request_name.starts_with('.');

        if !valid {
            return Err(StoreError::InvalidName(request_name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", request_name)))
    }

    fn load_all(&self) -> Result<Vec<RequestRecord>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            records.push(serde_json::from_str(&content)?);
        }
        Ok(records)
    }
}

impl RequestStore for JsonFileStore {
    fn insert(&mut self, record: &RequestRecord) -> Result<(), StoreError> {
        let path = self.document_path(&record.request_name)?;
        if path.exists() {
            return Err(StoreError::AlreadyExists(record.request_name.clone()));
        }

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(record)?)?;

        info!("Saved request document to {}", path.display());
        Ok(())
    }

    fn get(&self, request_name: &str) -> Result<Option<RequestRecord>, StoreError> {
        let path = self.document_path(request_name)?;
        if !path.exists() {
            debug!("No document for request '{}'", request_name);
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn count_campaign(&self, campaign: &str) -> Result<usize, StoreError> {
        Ok(self
            .load_all()?
            .iter()
            .filter(|r| r.campaign == campaign)
            .count())
    }
}
