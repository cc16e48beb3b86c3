//! File-backed provider: the volume/snapshot inventory as one JSON file.
//!
//! Format:
//! {
//!   "next_snapshot_id": 5,
//!   "volumes":   [ {"id":"vol-...","tags":{...},"attachment":{...}}, ... ],
//!   "snapshots": [ {"id":"snap-...","volume_id":"vol-...","description":"...",
//!                   "status":"completed","started_at":"2016-01-01T10:00:00Z"}, ... ]
//! }
//!
//! Every mutating call persists the whole file atomically via tmp+rename.
//! This is the Provider the CLI runs against; it stands where a cloud SDK
//! binding would otherwise sit (wire formats are out of scope).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::filter::TagFilter;
use crate::model::{Snapshot, SnapshotStatus, Volume};
use crate::provider::Provider;
use crate::select::select_volumes;

#[derive(Debug, Default, Serialize, Deserialize)]
struct InventoryFile {
    #[serde(default = "default_next_id")]
    next_snapshot_id: u64,
    #[serde(default)]
    volumes: Vec<Volume>,
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

fn default_next_id() -> u64 {
    1
}

/// Provider over a JSON inventory file.
pub struct JsonInventory {
    path: PathBuf,
    state: InventoryFile,
}

impl JsonInventory {
    /// Open an inventory file. A missing file is a valid empty inventory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let bytes =
                fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("parse {}", path.display()))?
        } else {
            debug!("inventory {} does not exist, starting empty", path.display());
            InventoryFile {
                next_snapshot_id: 1,
                ..Default::default()
            }
        };
        Ok(JsonInventory { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .with_context(|| format!("open {}", tmp.display()))?;
        let data = serde_json::to_vec_pretty(&self.state).context("serialize inventory")?;
        f.write_all(&data)?;
        let _ = f.sync_all();
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}

impl Provider for JsonInventory {
    fn list_volumes(&self, filter: Option<&TagFilter>) -> Result<Vec<Volume>> {
        match filter {
            Some(f) if !f.is_empty() => select_volumes(&self.state.volumes, f, false),
            _ => Ok(self.state.volumes.clone()),
        }
    }

    fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        Ok(self
            .state
            .snapshots
            .iter()
            .filter(|s| s.status != SnapshotStatus::Deleted)
            .cloned()
            .collect())
    }

    fn create_snapshot(&mut self, volume_id: &str, description: &str) -> Result<Snapshot> {
        if !self.state.volumes.iter().any(|v| v.id == volume_id) {
            bail!("unknown volume {volume_id}");
        }
        let snap = Snapshot {
            id: format!("snap-{:08x}", self.state.next_snapshot_id),
            volume_id: volume_id.to_string(),
            description: description.to_string(),
            status: SnapshotStatus::Completed,
            started_at: Utc::now(),
        };
        self.state.next_snapshot_id += 1;
        self.state.snapshots.push(snap.clone());
        self.save()?;
        Ok(snap)
    }

    fn delete_snapshot(&mut self, snapshot_id: &str) -> Result<()> {
        let Some(snap) = self
            .state
            .snapshots
            .iter_mut()
            .find(|s| s.id == snapshot_id)
        else {
            bail!("unknown snapshot {snapshot_id}");
        };
        snap.status = SnapshotStatus::Deleted;
        self.save()
    }
}
