pub mod accounts;
pub mod report;

use crate::ledger::{gnucash, Snapshot};
use anyhow::Context;
use std::path::Path;
use std::time::Instant;

/// Load a ledger snapshot from a GnuCash XML file, logging the load time.
pub fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let started = Instant::now();
    let snapshot = gnucash::read_file(path)
        .with_context(|| format!("failed to load ledger {}", path.display()))?;
    log::debug!(
        "ledger loaded in {:?} ({} transactions)",
        started.elapsed(),
        snapshot.transactions().len()
    );
    Ok(snapshot)
}
