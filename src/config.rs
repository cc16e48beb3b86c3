//! Keeper configuration: a single place for the knobs instead of threading
//! loose arguments through every call.

use anyhow::{bail, Result};

use crate::filter::TagFilter;

pub const DEFAULT_MARKER: &str = "SNAPKEEPER";
pub const DEFAULT_KEEP_PER_VOLUME: usize = 3;

/// Configuration shared by the create and prune passes.
#[derive(Clone, Debug)]
pub struct KeeperConfig {
    /// Provider region the run operates in. Opaque to the decision logic;
    /// carried for logging and provider construction.
    pub region: String,
    /// Ownership marker written as the snapshot description prefix.
    pub marker: String,
    /// Optional schedule label ("daily", "weekly", ...) qualifying the marker.
    pub label: Option<String>,
    /// Completed snapshots to keep per volume when pruning.
    pub keep_per_volume: usize,
    /// Tag constraints scoping the volume selection.
    pub filter: TagFilter,
    /// Deny-list mode: drop volumes matching any filter (key, value) pair.
    pub invert_filter: bool,
}

impl KeeperConfig {
    pub fn new(region: impl Into<String>) -> Self {
        KeeperConfig {
            region: region.into(),
            marker: DEFAULT_MARKER.to_string(),
            label: None,
            keep_per_volume: DEFAULT_KEEP_PER_VOLUME,
            filter: TagFilter::default(),
            invert_filter: false,
        }
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn keep_per_volume(mut self, keep: usize) -> Self {
        self.keep_per_volume = keep;
        self
    }

    pub fn filter(mut self, filter: TagFilter, invert: bool) -> Self {
        self.filter = filter;
        self.invert_filter = invert;
        self
    }

    /// Reject configurations that must never reach selection or planning.
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() {
            bail!("ownership marker must not be empty");
        }
        if self.invert_filter && self.filter.is_empty() {
            bail!("inverted tag match requires at least one tag filter");
        }
        Ok(())
    }
}

/// Resolve the region: explicit flag first, then the conventional env vars.
/// This tool does not probe instance metadata; off-instance runs must say
/// where to operate.
pub fn resolve_region(flag: Option<String>) -> Result<String> {
    if let Some(region) = flag {
        return Ok(region);
    }
    for var in ["AWS_REGION", "AWS_DEFAULT_REGION"] {
        if let Ok(region) = std::env::var(var) {
            if !region.is_empty() {
                return Ok(region);
            }
        }
    }
    bail!("could not determine region: pass --region or set AWS_REGION / AWS_DEFAULT_REGION");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filters;

    #[test]
    fn defaults() {
        let cfg = KeeperConfig::new("us-east-1");
        assert_eq!(cfg.marker, DEFAULT_MARKER);
        assert_eq!(cfg.keep_per_volume, DEFAULT_KEEP_PER_VOLUME);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invert_without_filters_rejected() {
        let cfg = KeeperConfig::new("us-east-1").filter(TagFilter::default(), true);
        assert!(cfg.validate().is_err());

        let f = parse_filters(&["name:foo"]).unwrap();
        let cfg = KeeperConfig::new("us-east-1").filter(f, true);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_marker_rejected() {
        let cfg = KeeperConfig::new("us-east-1").marker("");
        assert!(cfg.validate().is_err());
    }

    // Env mutations live in one test so parallel siblings cannot race them.
    #[test]
    fn region_resolution_chain() {
        std::env::remove_var("AWS_REGION");
        std::env::remove_var("AWS_DEFAULT_REGION");

        // No flag, no env: a configuration error pointing at --region.
        let err = resolve_region(None).unwrap_err();
        assert!(err.to_string().contains("--region"));

        std::env::set_var("AWS_DEFAULT_REGION", "eu-west-1");
        assert_eq!(resolve_region(None).unwrap(), "eu-west-1");

        // AWS_REGION wins over AWS_DEFAULT_REGION.
        std::env::set_var("AWS_REGION", "us-east-2");
        assert_eq!(resolve_region(None).unwrap(), "us-east-2");

        // The explicit flag wins over everything.
        assert_eq!(
            resolve_region(Some("ap-southeast-1".to_string())).unwrap(),
            "ap-southeast-1"
        );

        std::env::remove_var("AWS_REGION");
        std::env::remove_var("AWS_DEFAULT_REGION");
    }
}
