//! The driving collaborator: wires config + provider around the pure
//! decision functions.
//!
//! Keeper owns no policy of its own. It selects volumes (select.rs), issues
//! one create per selection with the ownership description, asks retention.rs
//! for a deletion plan and issues one delete per entry. Create/delete calls
//! are best-effort per item: one failing entity never aborts the rest, and a
//! non-zero failure count surfaces as the pass error only after every entry
//! was attempted.

use anyhow::{bail, Result};
use log::{info, warn};

use crate::config::KeeperConfig;
use crate::model::{Snapshot, Volume};
use crate::provider::Provider;
use crate::retention::{plan_retention, RetentionPolicy};
use crate::select::select_volumes;

/// Dry-run output: what a full pass would do, without doing it.
#[derive(Clone, Debug, Default)]
pub struct PlanReport {
    pub to_snapshot: Vec<Volume>,
    pub to_delete: Vec<Snapshot>,
}

pub struct Keeper<P: Provider> {
    cfg: KeeperConfig,
    provider: P,
}

impl<P: Provider> Keeper<P> {
    /// Configuration errors (empty marker, invert without filters) are
    /// rejected here, before any inventory is touched.
    pub fn new(cfg: KeeperConfig, provider: P) -> Result<Self> {
        cfg.validate()?;
        info!("operating on region {}", cfg.region);
        Ok(Keeper { cfg, provider })
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(
            self.cfg.marker.clone(),
            self.cfg.label.clone(),
            self.cfg.keep_per_volume,
        )
    }

    /// Volumes in scope for this run. Allow-mode filtering is pushed down to
    /// the provider (same semantics by contract); deny mode fetches the full
    /// inventory and filters client side.
    fn volumes_in_scope(&self) -> Result<Vec<Volume>> {
        if self.cfg.invert_filter {
            let all = self.provider.list_volumes(None)?;
            select_volumes(&all, &self.cfg.filter, true)
        } else {
            self.provider.list_volumes(Some(&self.cfg.filter))
        }
    }

    /// Description contract: `<marker>[ <label>] <volume_id>[ <instance>][ <device>]`.
    /// Retention recognizes ownership by this exact prefix; change it and
    /// every future prune pass silently disowns the snapshot.
    fn describe(&self, volume: &Volume) -> String {
        let mut parts: Vec<&str> = vec![&self.cfg.marker];
        if let Some(label) = &self.cfg.label {
            parts.push(label);
        }
        parts.push(&volume.id);
        if let Some(att) = &volume.attachment {
            if let Some(instance_id) = &att.instance_id {
                parts.push(instance_id);
            }
            if let Some(device) = &att.device {
                parts.push(device);
            }
        }
        parts.join(" ")
    }

    /// Create one snapshot per selected volume.
    pub fn snapshot_volumes(&mut self) -> Result<Vec<Snapshot>> {
        info!("getting list of volumes");
        let volumes = self.volumes_in_scope()?;
        info!("found {} volume(s) to snapshot", volumes.len());

        let mut created = Vec::new();
        let mut failures = 0usize;
        for volume in &volumes {
            let description = self.describe(volume);
            info!("creating snapshot of {}: {}", volume.id, description);
            match self.provider.create_snapshot(&volume.id, &description) {
                Ok(snap) => created.push(snap),
                Err(e) => {
                    warn!("failed to snapshot {}: {e:#}", volume.id);
                    failures += 1;
                }
            }
        }
        if failures > 0 {
            bail!(
                "failed to create {failures} of {} snapshot(s)",
                volumes.len()
            );
        }
        Ok(created)
    }

    /// Prune owned snapshots down to the configured keep count per volume.
    /// Returns the snapshots actually deleted.
    pub fn remove_old_snapshots(&mut self) -> Result<Vec<Snapshot>> {
        let policy = self.policy();
        info!(
            "configured to keep {} snapshot(s) per volume (prefix '{}')",
            policy.keep_per_volume,
            policy.required_prefix()
        );
        info!("getting list of snapshots");
        let snapshots = self.provider.list_snapshots()?;
        info!("found {} snapshot(s)", snapshots.len());

        let plan = plan_retention(&snapshots, &policy);
        let mut deleted = Vec::new();
        let mut failures = 0usize;
        for snap in &plan {
            info!("deleting {}: {}", snap.id, snap.description);
            match self.provider.delete_snapshot(&snap.id) {
                Ok(()) => deleted.push(snap.clone()),
                Err(e) => {
                    warn!("failed to delete {}: {e:#}", snap.id);
                    failures += 1;
                }
            }
        }
        if failures > 0 {
            bail!("failed to delete {failures} of {} snapshot(s)", plan.len());
        }
        Ok(deleted)
    }

    /// Compute both decisions without issuing any create or delete call.
    pub fn plan(&self) -> Result<PlanReport> {
        let to_snapshot = self.volumes_in_scope()?;
        let snapshots = self.provider.list_snapshots()?;
        let to_delete = plan_retention(&snapshots, &self.policy());
        Ok(PlanReport {
            to_snapshot,
            to_delete,
        })
    }
}
