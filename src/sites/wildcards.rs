//! Site Wildcard Expansion
//!
//! A wildcard key such as `T1*` stands for every site whose name matches
//! the associated glob (`T1_*`). The map is built once from the site
//! catalog and never refreshed.

use std::collections::{BTreeMap, HashSet};

use globset::Glob;
use log::{debug, info};
use once_cell::sync::Lazy;

use super::SiteError;

/// Wildcard keys recognized when none are configured.
pub static DEFAULT_SITE_WILDCARDS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    [("T1*", "T1_*"), ("T2*", "T2_*"), ("T3*", "T3_*")]
        .into_iter()
        .map(|(key, pattern)| (key.to_string(), pattern.to_string()))
        .collect()
});

/// Read-only mapping from wildcard key to the concrete sites it denotes.
#[derive(Debug, Clone, Default)]
pub struct SiteWildcardMap {
    wildcards: BTreeMap<String, Vec<String>>,
}

impl SiteWildcardMap {
    /// Matches every wildcard pattern against the site list.
    ///
    /// Sites keep their catalog order within each expansion.
    ///
    /// # Example
    /// ```
    /// use crabinterface::sites::{SiteWildcardMap, DEFAULT_SITE_WILDCARDS};
    ///
    /// let sites = vec!["T1_US_FNAL".to_string(), "T2_CH_CERN".to_string(), "T1_IT_CNAF".to_string()];
    /// let map = SiteWildcardMap::build(&DEFAULT_SITE_WILDCARDS, &sites).unwrap();
    /// assert_eq!(map.get("T1*").unwrap(), &["T1_US_FNAL".to_string(), "T1_IT_CNAF".to_string()]);
    /// ```
    pub fn build(keys: &BTreeMap<String, String>, sites: &[String]) -> Result<Self, SiteError> {
        let mut wildcards = BTreeMap::new();

        for (key, pattern) in keys {
            let matcher = Glob::new(pattern)?.compile_matcher();
            let matching: Vec<String> = sites
                .iter()
                .filter(|site| matcher.is_match(site.as_str()))
                .cloned()
                .collect();

            debug!("Wildcard '{}' ({}) -> {:?}", key, pattern, matching);
            wildcards.insert(key.clone(), matching);
        }

        info!(
            "Built site wildcard map: {} keys over {} sites",
            wildcards.len(),
            sites.len()
        );
        Ok(Self { wildcards })
    }

    /// Returns true if `entry` is a recognized wildcard key.
    pub fn is_wildcard(&self, entry: &str) -> bool {
        self.wildcards.contains_key(entry)
    }

    /// Concrete sites for a wildcard key.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.wildcards.get(key).map(Vec::as_slice)
    }

    /// Recognized wildcard keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.wildcards.keys().map(String::as_str)
    }

    /// Replaces wildcard entries of a site list with the sites they denote.
    ///
    /// Other entries are kept as they are. The result holds each site once,
    /// in order of first appearance.
    pub fn expand(&self, entries: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::new();

        for entry in entries {
            let concrete = match self.wildcards.get(entry) {
                Some(sites) => sites.clone(),
                None => vec![entry.clone()],
            };

            for site in concrete {
                if seen.insert(site.clone()) {
                    expanded.push(site);
                }
            }
        }

        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<String> {
        ["T1_US_FNAL", "T2_CH_CERN", "T1_IT_CNAF", "T2_IT_Legnaro", "T3_US_FNALLPC"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_build_default_wildcards() {
        let map = SiteWildcardMap::build(&DEFAULT_SITE_WILDCARDS, &catalog()).unwrap();

        assert_eq!(map.get("T1*").unwrap(), &["T1_US_FNAL", "T1_IT_CNAF"]);
        assert_eq!(map.get("T2*").unwrap(), &["T2_CH_CERN", "T2_IT_Legnaro"]);
        assert_eq!(map.get("T3*").unwrap(), &["T3_US_FNALLPC"]);
        assert!(map.get("T0*").is_none());
    }

    #[test]
    fn test_build_custom_key() {
        let mut keys = BTreeMap::new();
        keys.insert("T2_IT*".to_string(), "T2_IT_*".to_string());

        let map = SiteWildcardMap::build(&keys, &catalog()).unwrap();
        assert_eq!(map.get("T2_IT*").unwrap(), &["T2_IT_Legnaro"]);
        assert!(!map.is_wildcard("T1*"));
    }

    #[test]
    fn test_build_invalid_pattern() {
        let mut keys = BTreeMap::new();
        keys.insert("bad".to_string(), "T1_[".to_string());

        assert!(matches!(
            SiteWildcardMap::build(&keys, &catalog()),
            Err(SiteError::Pattern(_))
        ));
    }

    #[test]
    fn test_expand_mixed_entries() {
        let map = SiteWildcardMap::build(&DEFAULT_SITE_WILDCARDS, &catalog()).unwrap();
        let entries = vec!["T2_CH_CERN".to_string(), "T1*".to_string(), "T1_US_FNAL".to_string()];

        assert_eq!(
            map.expand(&entries),
            vec!["T2_CH_CERN", "T1_US_FNAL", "T1_IT_CNAF"]
        );
    }

    #[test]
    fn test_expand_empty_wildcard() {
        let map = SiteWildcardMap::build(&DEFAULT_SITE_WILDCARDS, &["T2_CH_CERN".to_string()]).unwrap();
        assert!(map.expand(&["T1*".to_string()]).is_empty());
    }
}
