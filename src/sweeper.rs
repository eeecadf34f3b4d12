use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::error::SweepError;
use crate::models::SimulationStatus;
use crate::store::SimulationStore;

/// Marks simulations that have sat in `generating` longer than
/// `stale_after_secs` as `failed`. These are left behind when a process dies
/// between the model call and the status update. Returns how many were failed.
pub async fn sweep_orphans(
    store: &dyn SimulationStore,
    stale_after_secs: i64,
    now: DateTime<Utc>,
) -> Result<usize, SweepError> {
    let cutoff = Duration::try_seconds(stale_after_secs)
        .and_then(|stale_after| now.checked_sub_signed(stale_after))
        .ok_or(SweepError::ThresholdOutOfRange(stale_after_secs))?;
    let candidates = store.list_by_status(SimulationStatus::Generating).await?;
    info!(
        "Found {} generating simulations, cutoff {}",
        candidates.len(),
        cutoff
    );

    let mut failed = 0;
    for simulation in candidates.iter().filter(|s| s.updated_at < cutoff) {
        if store.fail_if_generating(simulation.id, now).await? {
            info!(
                "[{}] Orphaned since {}, marked failed",
                simulation.id, simulation.updated_at
            );
            failed += 1;
        } else {
            warn!("[{}] Status changed before sweep, skipped", simulation.id);
        }
    }

    Ok(failed)
}
