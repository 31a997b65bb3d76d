//! Planning-log and result-artifact parsing
//!
//! The planning log is a JSON transcript of the planner agent; the
//! result artifact is an HTML summary table. Both are produced by the
//! test harness, so extraction works on their known shapes rather than
//! a general document model.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Outcome and video pointer parsed from the HTML result artifact
#[derive(Debug, Clone)]
pub struct RunArtifact {
    /// Outcome label from the summary table, when present
    pub outcome: Option<String>,

    /// Path of the proofs video recorded during the run
    pub video_path: PathBuf,
}

static OUTCOME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<td[^>]*>\s*Outcome:\s*</td>\s*<td[^>]*>(.*?)</td>").expect("valid regex")
});

static PROOFS_VIDEO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<th[^>]*>[^<]*Proofs\s+Video[^<]*</th>\s*<td[^>]*>(.*?)</td>")
        .expect("valid regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Parse the ordered step descriptions out of the planning log.
///
/// The log holds a `planner_agent` entry list; the first entry whose
/// `content` object carries a `plan` string wins and later entries are
/// ignored. The plan is a newline-separated list of numbered lines
/// ("1. Do X"); numbering is stripped, unnumbered lines are not steps.
pub fn parse_planning_log(path: &Path) -> AnalysisResult<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&raw)?;

    let mut steps = Vec::new();
    if let Some(entries) = data.get("planner_agent").and_then(Value::as_array) {
        for entry in entries {
            if let Some(plan) = entry.pointer("/content/plan").and_then(Value::as_str) {
                for line in plan.lines() {
                    if let Some(step) = strip_step_number(line) {
                        steps.push(step.to_string());
                    }
                }
                break;
            }
        }
    }

    debug!("Parsed {} plan step(s) from {}", steps.len(), path.display());
    Ok(steps)
}

/// Strip the leading "1." / "12)" numbering from a plan line.
fn strip_step_number(line: &str) -> Option<&str> {
    let line = line.trim();
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .unwrap_or(rest);
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Parse the outcome and the proofs-video path from the result artifact.
///
/// The outcome cell is optional; a missing "Proofs Video" header is a
/// fatal parse error because the rest of the pipeline has nothing to
/// sample without it.
pub fn parse_final_output(path: &Path) -> AnalysisResult<RunArtifact> {
    let html = std::fs::read_to_string(path)?;

    let outcome = OUTCOME_RE
        .captures(&html)
        .map(|c| strip_tags(&c[1]))
        .filter(|s| !s.is_empty());

    let video = PROOFS_VIDEO_RE
        .captures(&html)
        .map(|c| strip_tags(&c[1]))
        .filter(|s| !s.is_empty());

    match video {
        Some(video) => Ok(RunArtifact {
            outcome,
            video_path: PathBuf::from(video),
        }),
        None => Err(AnalysisError::ProofsVideoNotFound(
            path.display().to_string(),
        )),
    }
}

/// Reduce a table cell's inner HTML to its text content.
fn strip_tags(cell: &str) -> String {
    TAG_RE.replace_all(cell, "").trim().to_string()
}
