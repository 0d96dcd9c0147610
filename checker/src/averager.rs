//! Folding process samples into per-process size figures

use crate::collector::ProcessSample;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SizeAverages {
    pub real_avg_mb: f64,
    pub shared_avg_mb: f64,
    pub real_total_mb: f64,
    pub running_count: u64,
}

impl SizeAverages {
    /// Fold samples in order.
    ///
    /// Every sample adds its real size (resident - shared) to the total.
    /// Non-root samples also feed `avg = (avg + x) / 2`, seeded with the first
    /// such sample. This weights later samples more heavily than earlier ones
    /// and is deliberately not an arithmetic mean: stored history and the
    /// projections depend on this exact recurrence.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a ProcessSample>) -> Self {
        let mut sizes = SizeAverages::default();
        for sample in samples {
            sizes.add(sample);
        }
        sizes
    }

    pub fn add(&mut self, sample: &ProcessSample) {
        let real = sample.real_mb();
        self.real_total_mb += real;
        if sample.is_excluded() {
            return;
        }
        if self.running_count == 0 {
            self.real_avg_mb = real;
            self.shared_avg_mb = sample.shared_mb;
        } else {
            self.real_avg_mb = (self.real_avg_mb + real) / 2.0;
            self.shared_avg_mb = (self.shared_avg_mb + sample.shared_mb) / 2.0;
        }
        self.running_count += 1;
    }
}
