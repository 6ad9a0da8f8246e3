//! One reconciliation run: fetch, diff against the stored snapshot, persist.

use crate::error;
use crate::fetch::fetch_list;
use crate::platform::Platform;
use crate::store::SnapshotStore;
use chrono::{SecondsFormat, Utc};
use followtrack_core::account::{Account, ListKind};
use followtrack_core::reconcile::reconcile;
use indicatif::ProgressBar;
use log::info;
use serde::Serialize;
use std::time::Duration;

/// What a run found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub first_run: bool,
    pub added: Vec<Account>,
    pub removed: Vec<Account>,
    /// Followers in the fresh snapshot.
    pub total: usize,
}

/// Timestamp stamped on every change of a run.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fetch the follower list and reconcile it with the stored snapshot.
///
/// A failed fetch returns before the store is touched. Otherwise the change
/// rows (none on the first run) are appended, then the snapshot is replaced.
pub async fn run_check<P: Platform>(
    platform: &P,
    session: &P::Session,
    store: &mut SnapshotStore,
    pacing: Duration,
    timestamp: &str,
    spinner: Option<&ProgressBar>,
) -> error::Result<CheckReport> {
    let fresh = fetch_list(platform, session, ListKind::Followers, pacing, spinner).await?;
    let previous = store.load_snapshot()?;

    let result = reconcile(&fresh, &previous);
    if !result.first_run {
        store.append_changes(&result.changes(timestamp))?;
    }
    store.replace_snapshot(&fresh)?;

    info!(
        "{}: {} followers, {} new, {} lost{}",
        platform.kind(),
        fresh.len(),
        result.added.len(),
        result.removed.len(),
        if result.first_run { " (first run)" } else { "" }
    );

    Ok(CheckReport {
        first_run: result.first_run,
        added: result.added,
        removed: result.removed,
        total: fresh.len(),
    })
}
