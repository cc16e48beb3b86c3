use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::info;

use crate::config::{resolve_region, KeeperConfig, DEFAULT_KEEP_PER_VOLUME, DEFAULT_MARKER};
use crate::filter::parse_filters;
use crate::inventory::JsonInventory;
use crate::keeper::Keeper;

#[derive(Parser, Debug)]
#[command(
    name = "snapkeeper",
    version,
    about = "Snapshot volumes by tag, prune old snapshots per volume down to a keep count",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Inventory file the provider operates on
    #[arg(long)]
    inventory: PathBuf,

    /// Region to operate in (falls back to AWS_REGION / AWS_DEFAULT_REGION)
    #[arg(long)]
    region: Option<String>,

    /// Ownership marker written as the snapshot description prefix
    #[arg(long, default_value = DEFAULT_MARKER)]
    marker: String,

    /// Schedule label qualifying the marker, e.g. daily or weekly
    #[arg(long)]
    label: Option<String>,

    /// Completed snapshots to keep per volume when pruning
    #[arg(long, default_value_t = DEFAULT_KEEP_PER_VOLUME)]
    keep_per_volume: usize,

    /// Only act on volumes matching these tag filters, e.g. name:foo or
    /// name:['bar','baz']
    #[arg(long = "tag", value_name = "KEY:VALUE")]
    tags: Vec<String>,

    /// Invert the tag match: skip volumes carrying any listed (key, value) pair
    #[arg(long, requires = "tags")]
    invert_tags: bool,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create one snapshot per selected volume
    Backup {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Delete old owned snapshots beyond the keep count per volume
    Prune {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Backup, then prune
    Run {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Show what backup and prune would do, without doing it
    Plan {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn build_keeper(common: CommonArgs) -> Result<Keeper<JsonInventory>> {
    let region = resolve_region(common.region)?;
    let filter = parse_filters(&common.tags)?;
    let cfg = KeeperConfig::new(region)
        .marker(common.marker)
        .label(common.label)
        .keep_per_volume(common.keep_per_volume)
        .filter(filter, common.invert_tags);
    let provider = JsonInventory::open(common.inventory)?;
    Keeper::new(cfg, provider)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Backup { common } => {
            let mut keeper = build_keeper(common)?;
            let created = keeper.snapshot_volumes()?;
            println!("Created {} snapshot(s)", created.len());
            for snap in &created {
                println!("  {}: {}", snap.id, snap.description);
            }
        }
        Cmd::Prune { common } => {
            let mut keeper = build_keeper(common)?;
            let deleted = keeper.remove_old_snapshots()?;
            println!("Deleted {} snapshot(s)", deleted.len());
            for snap in &deleted {
                println!("  {}: {}", snap.id, snap.description);
            }
        }
        Cmd::Run { common } => {
            let mut keeper = build_keeper(common)?;
            let created = keeper.snapshot_volumes()?;
            let deleted = keeper.remove_old_snapshots()?;
            println!(
                "Created {} snapshot(s), deleted {} snapshot(s)",
                created.len(),
                deleted.len()
            );
            info!("snapkeeper run completed");
        }
        Cmd::Plan { common } => {
            let keeper = build_keeper(common)?;
            let report = keeper.plan()?;
            println!("Would snapshot {} volume(s):", report.to_snapshot.len());
            for vol in &report.to_snapshot {
                println!("  {}", vol.id);
            }
            println!("Would delete {} snapshot(s):", report.to_delete.len());
            for snap in &report.to_delete {
                println!("  {}: {} ({})", snap.id, snap.description, snap.started_at);
            }
        }
    }
    Ok(())
}
