//! Deviation report assembly and serialization

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AnalysisResult;
use crate::verifier::StepVerdict;

/// Per-step verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "✅ Observed")]
    Observed,
    #[serde(rename = "❌ Deviation")]
    Deviation,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Observed => "✅ Observed",
            Verdict::Deviation => "❌ Deviation",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the deviation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "Step")]
    pub step: String,

    #[serde(rename = "Result")]
    pub result: Verdict,

    #[serde(rename = "Notes")]
    pub notes: String,
}

impl ReportEntry {
    pub fn from_verdict(step: String, verdict: StepVerdict) -> Self {
        Self {
            step,
            result: if verdict.observed {
                Verdict::Observed
            } else {
                Verdict::Deviation
            },
            notes: verdict.notes,
        }
    }
}

/// Fatal-failure report line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub error: String,
}

/// The terminal artifact of one analysis run
///
/// Either per-step verdicts in plan order, or the uniform failure
/// contract: a single-element list carrying the error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviationReport {
    Completed(Vec<ReportEntry>),
    Failed([ErrorEntry; 1]),
}

impl DeviationReport {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed([ErrorEntry {
            error: message.into(),
        }])
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Write the report as pretty-printed JSON next to the result artifact.
///
/// Non-ASCII is preserved as-is (the verdict markers are multibyte).
pub fn write_report(report: &DeviationReport, final_output: &Path) -> AnalysisResult<PathBuf> {
    let dir = final_output.parent().filter(|p| !p.as_os_str().is_empty());
    let path = dir.unwrap_or_else(|| Path::new(".")).join("deviation_report.json");
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    info!("Report written to: {}", path.display());
    Ok(path)
}
