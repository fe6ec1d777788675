//! Site Name Resolution
//!
//! Provides the catalog of known computing sites and the expansion of
//! wildcard site patterns (`T1*`, `T2*`, ...) into concrete site names.
//!
//! # Structure
//!
//! - [`catalog`]: Sources of known site names
//! - [`wildcards`]: Wildcard key expansion against a catalog

pub mod catalog;
pub mod wildcards;

use thiserror::Error;

pub use catalog::{FileCatalog, SiteCatalog, StaticCatalog};
pub use wildcards::{SiteWildcardMap, DEFAULT_SITE_WILDCARDS};

/// Errors raised while loading sites or compiling wildcard patterns.
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("failed to read site catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse site catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid site wildcard pattern: {0}")]
    Pattern(#[from] globset::Error),
}
