//! Inventory records consumed by the decision logic.
//!
//! These are immutable snapshots of provider state as of the listing call.
//! The core never mutates them; the only state transition in the system is
//! a snapshot's status flipping to `deleted`, and that happens inside a
//! Provider implementation as the terminal effect of a delete call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a volume is attached, if anywhere. Only used when composing the
/// snapshot description; never consulted by selection or retention.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// A block-storage volume as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    /// Tag key -> tag value. Keys are unique by construction of the map.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Volume {
    pub fn new(id: impl Into<String>) -> Self {
        Volume {
            id: id.into(),
            tags: BTreeMap::new(),
            attachment: None,
        }
    }

    pub fn with_tags<K, V>(id: impl Into<String>, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Volume {
            id: id.into(),
            tags: tags
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            attachment: None,
        }
    }
}

/// Snapshot lifecycle status. Only `Completed` snapshots are counted (and
/// ever deleted) by retention planning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Pending,
    Completed,
    Error,
    Deleted,
}

/// A volume snapshot as reported by the provider.
///
/// `volume_id` is a foreign key that need not reference a volume that still
/// exists; retention grouping works purely on the id string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    /// Ownership marker (and optional schedule label) live here as a literal
    /// prefix; see RetentionPolicy::required_prefix.
    pub description: String,
    pub status: SnapshotStatus,
    pub started_at: DateTime<Utc>,
}
