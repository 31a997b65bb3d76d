//! Analysis pipeline orchestration

use std::path::Path;

use tracing::{error, info};

use crate::artifact;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisResult;
use crate::filter;
use crate::frame::FilteredFrames;
use crate::report::{DeviationReport, ReportEntry};
use crate::sampler::FrameSampler;
use crate::verifier::{StepVerifier, VisionChatClient};
use crate::window;

/// Runs the full plan-versus-video analysis for one recorded test run
///
/// Stages execute sequentially: parse artifacts, sample frames, filter
/// them, allocate per-step windows, verify steps one at a time. Each
/// run owns its own filtered frame set; nothing is shared across runs.
pub struct Analyzer<C> {
    sampler: FrameSampler,
    verifier: StepVerifier<C>,
}

impl<C: VisionChatClient> Analyzer<C> {
    pub fn new(config: &AnalyzerConfig, client: C) -> Self {
        Self {
            sampler: FrameSampler::new(config.interval_secs),
            verifier: StepVerifier::new(client),
        }
    }

    /// Produce the deviation report for one run.
    ///
    /// Never returns an error: any fatal stage failure collapses into
    /// the single-element failure report, the uniform contract for the
    /// whole pipeline.
    pub async fn analyze(&self, planning_log: &Path, final_output: &Path) -> DeviationReport {
        match self.run(planning_log, final_output).await {
            Ok(entries) => DeviationReport::Completed(entries),
            Err(e) => {
                error!("Analysis failed: {e}");
                DeviationReport::failed(e.to_string())
            }
        }
    }

    async fn run(
        &self,
        planning_log: &Path,
        final_output: &Path,
    ) -> AnalysisResult<Vec<ReportEntry>> {
        let steps = artifact::parse_planning_log(planning_log)?;
        let run = artifact::parse_final_output(final_output)?;
        info!(
            "Analyzing {} step(s) against {} (outcome: {})",
            steps.len(),
            run.video_path.display(),
            run.outcome.as_deref().unwrap_or("unknown")
        );

        let frames = self.sampler.sample(&run.video_path).await?;
        let filtered = filter::filter_frames(&self.verifier, frames).await;

        Ok(self.verify_steps(&steps, &filtered).await)
    }

    /// Judge every step against its allocated frame window, in plan
    /// order. Verdict order always matches step order.
    pub async fn verify_steps(
        &self,
        steps: &[String],
        frames: &FilteredFrames,
    ) -> Vec<ReportEntry> {
        let windows = window::allocate(frames.len(), steps.len());
        let mut entries = Vec::with_capacity(steps.len());

        for (step, range) in steps.iter().zip(windows) {
            let verdict = self.verifier.verify_step(step, frames.window(range)).await;
            entries.push(ReportEntry::from_verdict(step.clone(), verdict));
        }

        entries
    }
}
