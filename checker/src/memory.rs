//! Host memory snapshot (reads /proc/meminfo)

use crate::error::{CheckError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const MEMINFO_PATH: &str = "/proc/meminfo";

/// Physical and swap memory, in megabytes, captured once per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub total_mb: f64,
    pub free_mb: f64,
    pub cached_mb: f64,
    pub swap_total_mb: f64,
    pub swap_free_mb: f64,
}

impl MemorySnapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| CheckError::unavailable("memory stats", path, e))?;
        Ok(Self::parse(&content))
    }

    /// Parse `KEY:   NUMBER kB` lines. Keys that are absent stay at 0.
    pub fn parse(content: &str) -> Self {
        let mut snapshot = MemorySnapshot::default();
        for line in content.lines() {
            let Some((key, rest)) = line.split_once(':') else { continue };
            let slot = match key.trim() {
                "MemTotal" => &mut snapshot.total_mb,
                "MemFree" => &mut snapshot.free_mb,
                "Cached" => &mut snapshot.cached_mb,
                "SwapTotal" => &mut snapshot.swap_total_mb,
                "SwapFree" => &mut snapshot.swap_free_mb,
                _ => continue,
            };
            if let Some(kb) = rest.split_whitespace().next().and_then(|v| v.parse::<f64>().ok()) {
                *slot = kb / 1024.0;
            }
        }
        snapshot
    }
}
