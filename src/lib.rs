// Core decision logic: pure functions from inventory to decisions.
pub mod filter;
pub mod model;
pub mod retention;
pub mod select;

// Provider seam and implementations.
pub mod inventory;
pub mod provider;

// Collaborator plumbing (config, keeper, CLI).
pub mod cli;
pub mod config;
pub mod keeper;

// Convenient re-exports.
pub use config::KeeperConfig;
pub use filter::{parse_filters, TagConstraint, TagFilter};
pub use inventory::JsonInventory;
pub use keeper::{Keeper, PlanReport};
pub use model::{Attachment, Snapshot, SnapshotStatus, Volume};
pub use provider::{MemoryProvider, Provider};
pub use retention::{plan_retention, RetentionPolicy};
pub use select::select_volumes;
