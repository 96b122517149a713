//! Progress and ETA figures for run status polling

use chrono::{DateTime, Utc};

use shared::RunStatus;
use crate::types::{Run, RunStatusView};

/// `round(processed / total * 100)`, 0 when there is nothing to process
pub fn progress_percent(processed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (processed as f64 / total as f64 * 100.0).round() as u32
}

/// `elapsed / processed * remaining`, in whole minutes rounded up.
///
/// Only meaningful while processing with at least one item done.
pub fn eta_minutes(run: &Run, now: DateTime<Utc>) -> Option<u64> {
    if run.status != RunStatus::Processing || run.processed_items == 0 {
        return None;
    }

    let elapsed_ms = (now - run.started_at).num_milliseconds().max(0) as f64;
    let per_item_ms = elapsed_ms / run.processed_items as f64;
    let remaining = run.total_items.saturating_sub(run.processed_items) as f64;

    Some((per_item_ms * remaining / 60_000.0).ceil() as u64)
}

pub fn status_view(run: Run, now: DateTime<Utc>) -> RunStatusView {
    RunStatusView {
        progress_percent: progress_percent(run.processed_items, run.total_items),
        eta_minutes: eta_minutes(&run, now),
        run,
    }
}
