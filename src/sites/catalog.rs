//! Known Site Catalogs

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::SiteError;

/// Source of the full list of known site names.
pub trait SiteCatalog {
    /// Returns every known site name.
    fn all_site_names(&self) -> Result<Vec<String>, SiteError>;
}

/// A catalog backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    sites: Vec<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sites: sites.into_iter().map(Into::into).collect(),
        }
    }
}

impl SiteCatalog for StaticCatalog {
    fn all_site_names(&self) -> Result<Vec<String>, SiteError> {
        Ok(self.sites.clone())
    }
}

/// A catalog read from disk on every call.
///
/// Accepts either a JSON array of names or a plain text file with one
/// name per line (`#` starts a comment).
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SiteCatalog for FileCatalog {
    fn all_site_names(&self) -> Result<Vec<String>, SiteError> {
        let content = fs::read_to_string(&self.path)?;

        let sites: Vec<String> = if content.trim_start().starts_with('[') {
            serde_json::from_str(&content)?
        } else {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect()
        };

        info!("Loaded {} sites from {}", sites.len(), self.path.display());
        debug!("Known sites: {:?}", sites);
        Ok(sites)
    }
}
