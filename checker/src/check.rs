//! The calculation pipeline, from typed inputs to a verdict

use crate::averager::SizeAverages;
use crate::capacity;
use crate::collector::ProcessSample;
use crate::history::HistoricalRecord;
use crate::memory::MemorySnapshot;
use crate::profile::Resolution;
use crate::report::Report;
use crate::verdict;
use std::path::PathBuf;

pub struct CheckInputs {
    pub exe: PathBuf,
    pub config_file: PathBuf,
    pub resolution: Resolution,
    pub memory: MemorySnapshot,
    pub samples: Vec<ProcessSample>,
    pub history: Option<HistoricalRecord>,
    /// Percent of free swap allowed before a WARNING (0-100).
    pub swap_tolerance_pct: u8,
}

pub fn evaluate(inputs: CheckInputs) -> Report {
    let sizes = SizeAverages::from_samples(&inputs.samples);
    let limits = inputs.resolution.profile.effective_limits();
    let projection = capacity::project(&sizes, &limits, &inputs.memory, inputs.history.as_ref());
    let verdict = verdict::classify(
        projection.total_mb,
        inputs.memory.total_mb,
        inputs.memory.swap_free_mb,
        f64::from(inputs.swap_tolerance_pct),
    );

    Report {
        exe: inputs.exe,
        config_file: inputs.config_file,
        profile: inputs.resolution.profile,
        notes: inputs.resolution.notes,
        memory: inputs.memory,
        samples: inputs.samples,
        sizes,
        limits,
        projection,
        verdict,
    }
}
