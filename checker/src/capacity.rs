//! Projected peak memory use with every allowed httpd process running

use crate::averager::SizeAverages;
use crate::history::HistoricalRecord;
use crate::memory::MemorySnapshot;
use crate::profile::{ConcurrencyModel, EffectiveLimits};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Real size per process used for the projection.
    pub real_avg_mb: f64,
    /// Shared size used for the projection.
    pub shared_avg_mb: f64,
    /// True when a larger historical average replaced the current one.
    pub from_history: bool,
    pub worker_set_mb: f64,
    /// Everything that is not httpd, inferred by subtraction. May be negative.
    pub non_target_mb: f64,
    pub total_mb: f64,
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// New value for the bounding tunable (worker cap or `ServerLimit`).
    pub process_cap: u64,
    /// New worker cap (`process_cap * threads per process`).
    pub worker_cap: u64,
}

/// Project the footprint at the configured cap.
///
/// The historical record is only used when its real average is larger than
/// the current one. Nonsensical inputs still produce numbers; interpreting
/// them is left to the verdict.
pub fn project(
    sizes: &SizeAverages,
    limits: &EffectiveLimits,
    memory: &MemorySnapshot,
    history: Option<&HistoricalRecord>,
) -> Projection {
    let worse = history.filter(|h| h.real_avg_mb > sizes.real_avg_mb);
    let (real_avg_mb, shared_avg_mb) = match worse {
        Some(h) => {
            info!(
                "historical real average {:.2}MB exceeds current {:.2}MB, projecting with it",
                h.real_avg_mb, sizes.real_avg_mb
            );
            (h.real_avg_mb, h.shared_avg_mb)
        }
        None => (sizes.real_avg_mb, sizes.shared_avg_mb),
    };

    let worker_set_mb = real_avg_mb * limits.cap as f64 + shared_avg_mb;
    let non_target_mb =
        memory.total_mb - memory.cached_mb - memory.free_mb - sizes.real_total_mb - sizes.shared_avg_mb;

    Projection {
        real_avg_mb,
        shared_avg_mb,
        from_history: worse.is_some(),
        worker_set_mb,
        non_target_mb,
        total_mb: non_target_mb + worker_set_mb,
        recommendation: recommend(sizes, limits, memory),
    }
}

/// Largest cap the memory currently free or used by httpd could hold at the
/// current real average, rounded half away from zero.
pub fn recommend(
    sizes: &SizeAverages,
    limits: &EffectiveLimits,
    memory: &MemorySnapshot,
) -> Option<Recommendation> {
    if sizes.real_avg_mb <= 0.0 {
        return None;
    }
    let available = memory.free_mb + memory.cached_mb + sizes.real_total_mb + sizes.shared_avg_mb;
    let raw = available / sizes.real_avg_mb;
    if !raw.is_finite() {
        return None;
    }
    let process_cap = raw.round().max(0.0) as u64;
    let worker_cap = match limits.model {
        ConcurrencyModel::Prefork => process_cap,
        ConcurrencyModel::Threaded => process_cap.saturating_mul(limits.threads_per_process),
    };
    Some(Recommendation { process_cap, worker_cap })
}
