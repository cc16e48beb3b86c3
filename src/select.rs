//! Volume selection: which volumes are in scope for a backup pass.
//!
//! Two modes over the same TagFilter:
//! - allow (invert=false): a volume matches iff, for every distinct key in
//!   the filter, it carries that tag and the value is a member of the union
//!   of allowed values for that key. AND across keys.
//! - deny (invert=true): the filter is flattened into individual
//!   (key, value) pairs and a volume is dropped the moment any one of its
//!   tags equals any one flattened pair. This is intentionally NOT the
//!   per-key mirror of the allow path; the two modes are asymmetric and
//!   callers must not assume they partition the inventory.

use anyhow::{bail, Result};
use log::debug;

use crate::filter::TagFilter;
use crate::model::Volume;

/// Select the volumes matching `filter`. Result order follows input order.
///
/// An empty filter selects everything. Inverted selection against an empty
/// filter is a configuration error and is rejected before any volume is
/// examined.
pub fn select_volumes(volumes: &[Volume], filter: &TagFilter, invert: bool) -> Result<Vec<Volume>> {
    if filter.is_empty() {
        if invert {
            bail!("inverted tag match requires at least one tag filter");
        }
        return Ok(volumes.to_vec());
    }

    let selected: Vec<Volume> = if invert {
        let deny = filter.flattened_pairs();
        volumes
            .iter()
            .filter(|v| {
                !v.tags
                    .iter()
                    .any(|(k, val)| deny.contains(&(k.as_str(), val.as_str())))
            })
            .cloned()
            .collect()
    } else {
        let wanted = filter.merged_by_key();
        volumes
            .iter()
            .filter(|v| {
                wanted.iter().all(|(key, allowed)| {
                    v.tags
                        .get(*key)
                        .is_some_and(|val| allowed.contains(&val.as_str()))
                })
            })
            .cloned()
            .collect()
    };

    debug!(
        "selected {} of {} volume(s) (invert={})",
        selected.len(),
        volumes.len(),
        invert
    );
    Ok(selected)
}
