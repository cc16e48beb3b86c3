//! Provider seam: everything the keeper needs from the cloud side.
//!
//! The decision logic never talks to a provider; it consumes inventories
//! and returns decisions. The Provider trait is the boundary where real
//! I/O would live. This crate ships two implementations: MemoryProvider
//! (tests, dry runs) and inventory::JsonInventory (file-backed, used by the
//! CLI). A real cloud binding would implement the same four calls.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::filter::TagFilter;
use crate::model::{Snapshot, SnapshotStatus, Volume};
use crate::select::select_volumes;

/// Capability set required by the keeper. Implementations honoring the
/// `filter` argument of list_volumes must apply the exact allow-mode
/// semantics of `select_volumes`, so server-side and client-side filtering
/// agree.
pub trait Provider {
    fn list_volumes(&self, filter: Option<&TagFilter>) -> Result<Vec<Volume>>;
    /// Snapshots owned by the calling account.
    fn list_snapshots(&self) -> Result<Vec<Snapshot>>;
    fn create_snapshot(&mut self, volume_id: &str, description: &str) -> Result<Snapshot>;
    /// Flips the snapshot's status to `deleted`. Unknown ids are an error.
    fn delete_snapshot(&mut self, snapshot_id: &str) -> Result<()>;
}

/// In-memory provider over a fixed inventory.
///
/// Deletes flip status in place; creates append a `completed` snapshot
/// stamped with the provider clock. `fail_creates` / `fail_deletes` inject
/// per-id failures so best-effort execution can be exercised.
#[derive(Debug)]
pub struct MemoryProvider {
    volumes: Vec<Volume>,
    snapshots: Vec<Snapshot>,
    next_id: u64,
    now: Option<DateTime<Utc>>,
    fail_creates: Vec<String>,
    fail_deletes: Vec<String>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl MemoryProvider {
    pub fn new(volumes: Vec<Volume>, snapshots: Vec<Snapshot>) -> Self {
        MemoryProvider {
            volumes,
            snapshots,
            next_id: 1,
            now: None,
            fail_creates: Vec::new(),
            fail_deletes: Vec::new(),
        }
    }

    /// Pin the clock used to stamp created snapshots.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Make create_snapshot fail for the given volume id.
    pub fn fail_create_of(mut self, volume_id: impl Into<String>) -> Self {
        self.fail_creates.push(volume_id.into());
        self
    }

    /// Make delete_snapshot fail for the given id.
    pub fn fail_delete_of(mut self, snapshot_id: impl Into<String>) -> Self {
        self.fail_deletes.push(snapshot_id.into());
        self
    }

    /// Current inventory, deleted entries included.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

impl Provider for MemoryProvider {
    fn list_volumes(&self, filter: Option<&TagFilter>) -> Result<Vec<Volume>> {
        match filter {
            Some(f) if !f.is_empty() => select_volumes(&self.volumes, f, false),
            _ => Ok(self.volumes.clone()),
        }
    }

    fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        Ok(self
            .snapshots
            .iter()
            .filter(|s| s.status != SnapshotStatus::Deleted)
            .cloned()
            .collect())
    }

    fn create_snapshot(&mut self, volume_id: &str, description: &str) -> Result<Snapshot> {
        if self.fail_creates.iter().any(|id| id == volume_id) {
            bail!("snapshot of {volume_id} refused by provider");
        }
        if !self.volumes.iter().any(|v| v.id == volume_id) {
            bail!("unknown volume {volume_id}");
        }
        let snap = Snapshot {
            id: format!("snap-{:08x}", self.next_id),
            volume_id: volume_id.to_string(),
            description: description.to_string(),
            status: SnapshotStatus::Completed,
            started_at: self.now.unwrap_or_else(Utc::now),
        };
        self.next_id += 1;
        self.snapshots.push(snap.clone());
        Ok(snap)
    }

    fn delete_snapshot(&mut self, snapshot_id: &str) -> Result<()> {
        if self.fail_deletes.iter().any(|id| id == snapshot_id) {
            bail!("delete of {snapshot_id} refused by provider");
        }
        match self.snapshots.iter_mut().find(|s| s.id == snapshot_id) {
            Some(snap) => {
                snap.status = SnapshotStatus::Deleted;
                Ok(())
            }
            None => bail!("unknown snapshot {snapshot_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mints_ids_from_one() {
        assert_eq!(MemoryProvider::default().next_id, 1);

        let mut provider = MemoryProvider::new(vec![Volume::new("vol-1")], Vec::new());
        let snap = provider.create_snapshot("vol-1", "SNAPKEEPER vol-1").unwrap();
        assert_eq!(snap.id, "snap-00000001");
    }

    #[test]
    fn injected_create_failure_only_hits_its_volume() {
        let volumes = vec![Volume::new("vol-1"), Volume::new("vol-2")];
        let mut provider = MemoryProvider::new(volumes, Vec::new()).fail_create_of("vol-1");
        assert!(provider.create_snapshot("vol-1", "SNAPKEEPER vol-1").is_err());
        assert!(provider.create_snapshot("vol-2", "SNAPKEEPER vol-2").is_ok());
    }
}
