//! Text and JSON rendering of a run

use crate::averager::SizeAverages;
use crate::capacity::Projection;
use crate::collector::ProcessSample;
use crate::memory::MemorySnapshot;
use crate::profile::{ConfigProfile, EffectiveLimits};
use crate::verdict::Verdict;
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub exe: PathBuf,
    pub config_file: PathBuf,
    pub profile: ConfigProfile,
    pub notes: Vec<String>,
    pub memory: MemorySnapshot,
    pub samples: Vec<ProcessSample>,
    pub sizes: SizeAverages,
    pub limits: EffectiveLimits,
    pub projection: Projection,
    pub verdict: Verdict,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report. The process table is only listed when `verbose`.
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out, verbose);
        out
    }

    fn write_text(&self, out: &mut String, verbose: bool) -> fmt::Result {
        let p = &self.profile;
        writeln!(out, "Check httpd limits: {}", self.exe.display())?;
        writeln!(out, "  profile {}.{} {} ({})", p.version.0, p.version.1, p.mpm, self.config_file.display())?;
        for note in &self.notes {
            writeln!(out, "  note: {}", note)?;
        }

        let m = &self.memory;
        writeln!(out, "\nHost memory")?;
        writeln!(out, "  {:<12} {:>10.2} MB", "MemTotal", m.total_mb)?;
        writeln!(out, "  {:<12} {:>10.2} MB", "MemFree", m.free_mb)?;
        writeln!(out, "  {:<12} {:>10.2} MB", "Cached", m.cached_mb)?;
        writeln!(out, "  {:<12} {:>10.2} MB", "SwapTotal", m.swap_total_mb)?;
        writeln!(out, "  {:<12} {:>10.2} MB", "SwapFree", m.swap_free_mb)?;

        if verbose {
            writeln!(out, "\nHttpd processes")?;
            writeln!(
                out,
                "  {:<8} {:<8} {:<16} {:>10} {:>10} {:>10}",
                "PID", "PPID", "NAME", "RSS MB", "SHARED MB", "REAL MB"
            )?;
            for s in &self.samples {
                writeln!(
                    out,
                    "  {:<8} {:<8} {:<16} {:>10.2} {:>10.2} {:>10.2}{}",
                    s.pid,
                    s.parent_pid,
                    s.name,
                    s.resident_mb,
                    s.shared_mb,
                    s.real_mb(),
                    if s.is_excluded() { "  (root, not averaged)" } else { "" }
                )?;
            }
        }

        let z = &self.sizes;
        writeln!(out, "\nHttpd sizes")?;
        writeln!(out, "  {:<16} {:>10}", "Running", z.running_count)?;
        writeln!(out, "  {:<16} {:>10.2} MB", "Real average", z.real_avg_mb)?;
        writeln!(out, "  {:<16} {:>10.2} MB", "Shared average", z.shared_avg_mb)?;
        writeln!(out, "  {:<16} {:>10.2} MB", "Real total", z.real_total_mb)?;

        writeln!(out, "\nConfig limits")?;
        for (tunable, value) in &p.tunables {
            writeln!(out, "  {:<24} {:>8}", tunable.name(), value)?;
        }

        let j = &self.projection;
        let l = &self.limits;
        writeln!(out, "\nProjection")?;
        writeln!(out, "  {:<24} {:>10.2} MB", "Non-httpd processes", j.non_target_mb)?;
        writeln!(
            out,
            "  {:<24} {:>10.2} MB ({:.2} MB x {} + {:.2} MB{})",
            format!("Httpd at {} {}", l.bounding, l.cap),
            j.worker_set_mb,
            j.real_avg_mb,
            l.cap,
            j.shared_avg_mb,
            if j.from_history { ", historical" } else { "" }
        )?;
        writeln!(out, "  {:<24} {:>10.2} MB", "Projected total", j.total_mb)?;

        if let Some(r) = &j.recommendation {
            writeln!(out, "\nRecommendation")?;
            writeln!(out, "  {:<24} {:>8} -> {}", l.bounding.name(), l.cap, r.process_cap)?;
            if l.bounding != l.worker_cap_tunable {
                let current = p.get(l.worker_cap_tunable).unwrap_or(0);
                writeln!(out, "  {:<24} {:>8} -> {}", l.worker_cap_tunable.name(), current, r.worker_cap)?;
            }
        }

        writeln!(out, "\nResult: {} - {}", self.verdict.severity, self.verdict.message)?;
        Ok(())
    }
}
