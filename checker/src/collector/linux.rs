use super::{ProcessSample, ProcessSampler};
use crate::error::{CheckError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// Field positions in /proc/<pid>/stat, counted from 0 with the pid first.
const STAT_PPID: usize = 3;
const STAT_RSS_PAGES: usize = 23;
// Field position of the shared page count in /proc/<pid>/statm.
const STATM_SHARED_PAGES: usize = 2;

pub struct ProcSampler {
    proc_root: PathBuf,
    page_size: u64,
}

impl ProcSampler {
    pub fn new() -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        Self::with_root("/proc", u64::try_from(page_size).unwrap_or(4096))
    }

    /// Sampler over an arbitrary proc-style tree.
    pub fn with_root(proc_root: impl Into<PathBuf>, page_size: u64) -> Self {
        Self { proc_root: proc_root.into(), page_size }
    }

    fn pages_to_mb(&self, pages: u64) -> f64 {
        (pages * self.page_size) as f64 / 1024.0 / 1024.0
    }

    fn list_pids(&self) -> Result<Vec<u32>> {
        let entries = fs::read_dir(&self.proc_root)
            .map_err(|e| CheckError::unavailable("process table", &self.proc_root, e))?;
        let mut pids: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Read one matching process. `Ok(None)` means the process went away or
    /// its records were unusable, and the pid should be skipped.
    fn parse_process(&self, pid: u32) -> io::Result<Option<ProcessSample>> {
        let proc_dir = self.proc_root.join(pid.to_string());

        let stat = fs::read_to_string(proc_dir.join("stat"))?;
        let Some((name, fields)) = split_stat(&stat) else {
            warn!("pid {}: malformed stat record", pid);
            return Ok(None);
        };
        let field = |idx: usize| -> Option<u64> { fields.get(idx - 2)?.parse().ok() };
        let (Some(parent_pid), Some(rss_pages)) = (field(STAT_PPID), field(STAT_RSS_PAGES)) else {
            warn!("pid {}: stat record is missing ppid or rss", pid);
            return Ok(None);
        };

        let statm = fs::read_to_string(proc_dir.join("statm"))?;
        let Some(shared_pages) = statm
            .split_whitespace()
            .nth(STATM_SHARED_PAGES)
            .and_then(|v| v.parse::<u64>().ok())
        else {
            warn!("pid {}: malformed statm record", pid);
            return Ok(None);
        };

        Ok(Some(ProcessSample {
            pid,
            name: name.to_string(),
            parent_pid: parent_pid as u32,
            resident_mb: self.pages_to_mb(rss_pages),
            shared_mb: self.pages_to_mb(shared_pages),
        }))
    }
}

impl Default for ProcSampler {
    fn default() -> Self { Self::new() }
}

impl ProcessSampler for ProcSampler {
    fn sample(&self, exe: &Path) -> Result<Vec<ProcessSample>> {
        let mut samples = Vec::new();
        for pid in self.list_pids()? {
            // Kernel threads and other users' processes have no readable exe link.
            let Ok(target) = fs::read_link(self.proc_root.join(pid.to_string()).join("exe")) else {
                continue;
            };
            if target != exe {
                continue;
            }
            match self.parse_process(pid) {
                Ok(Some(sample)) => {
                    debug!(
                        "pid {} ({}) ppid {} rss {:.2}MB shared {:.2}MB",
                        sample.pid, sample.name, sample.parent_pid, sample.resident_mb, sample.shared_mb
                    );
                    samples.push(sample);
                }
                Ok(None) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("pid {} exited during the scan, skipping", pid);
                }
                Err(e) => warn!("pid {}: {}, skipping", pid, e),
            }
        }
        if samples.is_empty() {
            return Err(CheckError::NoMatchingProcess(exe.to_path_buf()));
        }
        Ok(samples)
    }
}

/// Split a stat record into the command name and the fields that follow it
/// (state onwards). The name may itself contain spaces or parentheses.
fn split_stat(stat: &str) -> Option<(&str, Vec<&str>)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    if close < open {
        return None;
    }
    let name = &stat[open + 1..close];
    let fields = stat[close + 1..].split_whitespace().collect();
    Some((name, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_stat_with_spaces_in_name() {
        let (name, fields) = split_stat("42 (my (odd) proc) S 1 42 42").unwrap();
        assert_eq!(name, "my (odd) proc");
        assert_eq!(fields, vec!["S", "1", "42", "42"]);
    }

    #[test]
    fn test_split_stat_rejects_garbage() {
        assert!(split_stat("no parens here").is_none());
    }
}
