//! OK / WARNING / ERROR classification of a projection

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl Severity {
    pub fn exit_code(self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Error => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub severity: Severity,
    pub message: String,
    /// Projected total minus the limit of the tier that decided the verdict.
    /// Zero or negative unless the verdict is ERROR.
    pub margin_mb: f64,
}

/// Classify `projected_mb` against RAM and free swap.
///
/// `swap_tolerance_pct` (0-100) is the share of free swap that may be used
/// before the verdict becomes a WARNING. Every tier limit is inclusive.
pub fn classify(projected_mb: f64, total_mb: f64, swap_free_mb: f64, swap_tolerance_pct: f64) -> Verdict {
    let tolerated_mb = total_mb + swap_free_mb * (swap_tolerance_pct / 100.0);
    let ceiling_mb = total_mb + swap_free_mb;

    let (severity, limit_mb, message) = if projected_mb <= total_mb {
        (Severity::Ok, total_mb, format!("{:.2}MB projected fits in {:.2}MB of RAM", projected_mb, total_mb))
    } else if projected_mb <= tolerated_mb {
        (
            Severity::Ok,
            tolerated_mb,
            format!(
                "{:.2}MB projected uses {:.2}MB of swap, within the {}% tolerance",
                projected_mb,
                projected_mb - total_mb,
                swap_tolerance_pct
            ),
        )
    } else if projected_mb <= ceiling_mb {
        (
            Severity::Warning,
            ceiling_mb,
            format!(
                "{:.2}MB projected exceeds {:.2}MB of RAM and uses {:.2}MB of swap",
                projected_mb,
                total_mb,
                projected_mb - total_mb
            ),
        )
    } else {
        (
            Severity::Error,
            ceiling_mb,
            format!(
                "{:.2}MB projected exceeds {:.2}MB of RAM plus free swap by {:.2}MB",
                projected_mb,
                ceiling_mb,
                projected_mb - ceiling_mb
            ),
        )
    };

    Verdict { severity, message, margin_mb: projected_mb - limit_mb }
}
