//! Process sampler (reads /proc on Linux)

mod linux;

pub use linux::ProcSampler;

use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Memory footprint of one process running the target executable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub parent_pid: u32,
    pub resident_mb: f64,
    pub shared_mb: f64,
}

impl ProcessSample {
    /// Root processes (the httpd parent) count towards totals but not averages.
    pub fn is_excluded(&self) -> bool {
        self.parent_pid <= 1
    }

    /// Marginal cost of the process: resident minus shared.
    pub fn real_mb(&self) -> f64 {
        self.resident_mb - self.shared_mb
    }
}

pub trait ProcessSampler {
    /// Sample every live process whose resolved executable equals `exe`.
    ///
    /// Returns samples in ascending pid order. Fails with
    /// `NoMatchingProcess` when nothing matches.
    fn sample(&self, exe: &Path) -> Result<Vec<ProcessSample>>;
}
