//! User Registry
//!
//! The request manager only accepts requests from identities it knows.
//! [`ensure_user`] registers a submitting user on first use.
//!
//! - [`MemoryRegistry`]: process-local registry, used in tests
//! - [`JsonFileRegistry`]: registry persisted to a JSON file

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a user registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("failed to access user registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt user registry: {0}")]
    Json(#[from] serde_json::Error),
}

/// A known submitting identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Username (hypernews login)
    pub username: String,
    /// Certificate distinguished name
    pub dn: String,
}

/// Store of identities known to the request manager.
pub trait UserRegistry {
    /// Looks up a user by username.
    fn find(&self, username: &str) -> Result<Option<User>, RegistryError>;

    /// Records a new user.
    fn register(&mut self, user: User) -> Result<(), RegistryError>;
}

/// Registers the user unless already known.
///
/// Returns true if the user was added.
pub fn ensure_user(
    registry: &mut dyn UserRegistry,
    dn: &str,
    username: &str,
) -> Result<bool, RegistryError> {
    if username.trim().is_empty() {
        return Err(RegistryError::InvalidUser("empty username".to_string()));
    }

    if registry.find(username)?.is_some() {
        debug!("User '{}' already registered", username);
        return Ok(false);
    }

    registry.register(User {
        username: username.to_string(),
        dn: dn.to_string(),
    })?;
    info!("Registered new user '{}' ({})", username, dn);
    Ok(true)
}

/// Registry kept in memory for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    users: BTreeMap<String, User>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserRegistry for MemoryRegistry {
    fn find(&self, username: &str) -> Result<Option<User>, RegistryError> {
        Ok(self.users.get(username).cloned())
    }

    fn register(&mut self, user: User) -> Result<(), RegistryError> {
        self.users.insert(user.username.clone(), user);
        Ok(())
    }
}

/// Registry persisted as a JSON object keyed by username.
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, User>, RegistryError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl UserRegistry for JsonFileRegistry {
    fn find(&self, username: &str) -> Result<Option<User>, RegistryError> {
        Ok(self.load()?.remove(username))
    }

    fn register(&mut self, user: User) -> Result<(), RegistryError> {
        let mut users = self.load()?;
        users.insert(user.username.clone(), user);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&users)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_user_registers_once() {
        let mut registry = MemoryRegistry::new();

        assert!(ensure_user(&mut registry, "/DC=ch/CN=jdoe", "jdoe").unwrap());
        assert!(!ensure_user(&mut registry, "/DC=ch/CN=jdoe", "jdoe").unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ensure_user_empty_username() {
        let mut registry = MemoryRegistry::new();
        let result = ensure_user(&mut registry, "/DC=ch/CN=x", "  ");

        assert!(matches!(result, Err(RegistryError::InvalidUser(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_json_registry_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");

        let mut registry = JsonFileRegistry::new(&path);
        ensure_user(&mut registry, "/DC=ch/CN=jdoe", "jdoe").unwrap();

        let reopened = JsonFileRegistry::new(&path);
        let user = reopened.find("jdoe").unwrap().unwrap();
        assert_eq!(user.dn, "/DC=ch/CN=jdoe");
        assert!(reopened.find("other").unwrap().is_none());
    }

    #[test]
    fn test_json_registry_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "not json").unwrap();

        let registry = JsonFileRegistry::new(&path);
        assert!(matches!(registry.find("jdoe"), Err(RegistryError::Json(_))));
    }
}
