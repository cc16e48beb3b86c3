//! Retention planning: which owned snapshots survive a pruning pass.
//!
//! The planner is a pure function from snapshot inventory + policy to a
//! deletion plan. It performs no I/O; issuing the actual deletes (and the
//! per-item best-effort handling that goes with them) is the Keeper's job.
//!
//! Ownership is decided by an exact, case-sensitive description prefix:
//! the marker alone, or `"<marker> <label>"` when the policy carries a
//! schedule label. Snapshots under the same marker but a different label
//! belong to a different policy instance and are never touched here.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::model::{Snapshot, SnapshotStatus};

/// Retention policy for one schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Ownership marker embedded as the description prefix.
    pub marker: String,
    /// Optional schedule label (e.g. "daily", "weekly") qualifying the marker.
    pub label: Option<String>,
    /// How many completed snapshots to keep per volume. 0 keeps none.
    pub keep_per_volume: usize,
}

impl RetentionPolicy {
    pub fn new(marker: impl Into<String>, label: Option<String>, keep_per_volume: usize) -> Self {
        RetentionPolicy {
            marker: marker.into(),
            label,
            keep_per_volume,
        }
    }

    /// The exact description prefix a snapshot must carry to be owned by
    /// this policy instance.
    pub fn required_prefix(&self) -> String {
        match &self.label {
            Some(label) => format!("{} {}", self.marker, label),
            None => self.marker.clone(),
        }
    }
}

/// Compute the deletion plan: every owned, completed snapshot beyond the
/// `keep_per_volume` most recent of its volume group.
///
/// Snapshots failing the prefix or completed-status test are ignored
/// entirely: never counted against the keep threshold, never deleted.
/// Within a group the sort is stable, newest first; equal timestamps keep
/// their inventory order. Groups are emitted in volume-id order, and
/// within a group the doomed entries come newest-excess-first, so the plan
/// is deterministic and idempotent on unchanged input.
pub fn plan_retention(snapshots: &[Snapshot], policy: &RetentionPolicy) -> Vec<Snapshot> {
    let prefix = policy.required_prefix();

    let mut groups: BTreeMap<&str, Vec<&Snapshot>> = BTreeMap::new();
    for snap in snapshots {
        if !snap.description.starts_with(&prefix) {
            debug!("skipping {}: description prefix does not match", snap.id);
            continue;
        }
        if snap.status != SnapshotStatus::Completed {
            debug!("skipping {}: not a completed snapshot", snap.id);
            continue;
        }
        groups.entry(snap.volume_id.as_str()).or_default().push(snap);
    }

    let mut plan = Vec::new();
    for (volume_id, mut group) in groups {
        // Stable: equal timestamps keep inventory order.
        group.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        info!(
            "found {} snapshot(s) for {}, keeping up to {}",
            group.len(),
            volume_id,
            policy.keep_per_volume
        );
        for snap in group.iter().skip(policy.keep_per_volume) {
            plan.push((*snap).clone());
        }
    }
    plan
}
