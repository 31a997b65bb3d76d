//! StepProof analysis pipeline
//!
//! Verifies whether a recorded automated-test run actually performed
//! the steps its plan claimed, by comparing the textual step plan
//! against frames sampled from the run's proofs video using a
//! vision-capable language model.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Analyzer (one run)                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  artifact::parse_planning_log()  -> Vec<Step>                │
//! │  artifact::parse_final_output()  -> outcome + video path     │
//! │  FrameSampler::sample()          -> Vec<Frame>   (ffmpeg)    │
//! │  filter::filter_frames()         -> FilteredFrames           │
//! │  window::allocate()              -> per-step Range<usize>    │
//! │  StepVerifier::verify_step()     -> StepVerdict  (per step)  │
//! │  report                          -> DeviationReport (JSON)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fatal artifact errors collapse into the single-element failure
//! report; a missing video degrades to an empty frame set; verifier
//! call failures default to safe verdicts. The pipeline always
//! produces a report.

pub mod analyzer;
pub mod artifact;
pub mod config;
pub mod error;
pub mod filter;
pub mod frame;
pub mod report;
pub mod sampler;
pub mod verifier;
pub mod window;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, LlmConfig};
pub use error::{AnalysisError, AnalysisResult};
pub use frame::{FilteredFrames, Frame};
pub use report::{DeviationReport, ReportEntry, Verdict};
pub use sampler::FrameSampler;
pub use verifier::{OpenAiVisionClient, PromptPart, StepVerdict, StepVerifier, VisionChatClient};
pub use window::WINDOW_CAP;
