//! Step verification against sampled frames
//!
//! The vision backend hides behind [`VisionChatClient`], a single
//! capability method taking interleaved text and image parts. The
//! shipped backend is an OpenAI-compatible chat-completions API; tests
//! inject scripted stubs through the same trait.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use image::ImageFormat;
use serde_json::json;
use tracing::warn;

use crate::config::LlmConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::frame::Frame;
use crate::window::WINDOW_CAP;

const SYSTEM_PROMPT: &str = "You are a visual verification agent. Given a step description \
    and a set of images (frames from a video), determine if the step is visible in any of \
    the frames. Respond with 'Observed' or 'Deviation' and a brief note.";

const BLANK_PROMPT: &str = "Is this image blank (all white, all black, or empty)? Respond \
    with 'Yes' if it is blank, otherwise 'No'. Do not explain, just answer 'Yes' or 'No'.";

/// One part of a multimodal prompt
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    /// PNG-encoded image bytes
    ImagePng(Vec<u8>),
}

/// Capability interface for a vision-capable chat backend
///
/// One call, one reply. Implementations own their transport; callers
/// only see text out and [`AnalysisError::VerifierCall`]-shaped
/// failures.
#[async_trait]
pub trait VisionChatClient: Send + Sync {
    async fn complete(&self, parts: &[PromptPart]) -> AnalysisResult<String>;
}

/// OpenAI-compatible chat-completions backend
pub struct OpenAiVisionClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiVisionClient {
    /// Build a client with the per-call timeout from the config.
    pub fn new(config: LlmConfig) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VisionChatClient for OpenAiVisionClient {
    async fn complete(&self, parts: &[PromptPart]) -> AnalysisResult<String> {
        let content: Vec<serde_json::Value> = parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => json!({"type": "text", "text": text}),
                PromptPart::ImagePng(bytes) => {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    json!({
                        "type": "image_url",
                        "image_url": {"url": format!("data:image/png;base64,{encoded}")}
                    })
                }
            })
            .collect();

        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": content},
            ],
            "temperature": self.config.temperature,
            "seed": self.config.seed,
        });

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AnalysisError::VerifierCall(format!(
                "model backend returned status {}",
                resp.status()
            )));
        }

        let reply: serde_json::Value = resp.json().await?;
        reply
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                AnalysisError::VerifierCall("reply had no message content".to_string())
            })
    }
}

/// Verdict for one plan step
#[derive(Debug, Clone)]
pub struct StepVerdict {
    /// True iff the model reply contained the literal marker "Observed"
    pub observed: bool,

    /// The full raw reply, or the error text for failed calls
    pub notes: String,
}

/// Judges plan steps (and frame blankness) from image evidence
pub struct StepVerifier<C> {
    client: C,
}

impl<C: VisionChatClient> StepVerifier<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Ask the model whether a frame is blank.
    ///
    /// Errors surface to the caller; the filter treats them as "not
    /// blank" so a transient failure never discards evidence.
    pub async fn is_blank(&self, frame: &Frame) -> AnalysisResult<bool> {
        let parts = vec![
            PromptPart::Text(BLANK_PROMPT.to_string()),
            PromptPart::ImagePng(encode_png(frame).await?),
        ];
        let reply = self.client.complete(&parts).await?;
        Ok(reply.trim().to_lowercase().starts_with("yes"))
    }

    /// Judge one step against its frame window.
    ///
    /// Never fails: an empty window and any call failure both map to a
    /// Deviation verdict with an explanatory note.
    pub async fn verify_step(&self, step: &str, frames: &[Frame]) -> StepVerdict {
        if frames.is_empty() {
            return StepVerdict {
                observed: false,
                notes: "No frames available to verify this step.".to_string(),
            };
        }

        match self.try_verify(step, frames).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Step verification call failed: {e}");
                StepVerdict {
                    observed: false,
                    notes: format!("Error: {e}"),
                }
            }
        }
    }

    async fn try_verify(&self, step: &str, frames: &[Frame]) -> AnalysisResult<StepVerdict> {
        let selected = subsample(frames, WINDOW_CAP);

        let mut parts = Vec::with_capacity(selected.len() + 1);
        parts.push(PromptPart::Text(format!(
            "Given the following step description, determine if the step is visible in any \
             of the provided images.\n\nStep: {step}\n\nFor each image, check if the step is \
             being performed or its result is visible. Respond with 'Observed' if you see \
             evidence, otherwise 'Deviation'. Provide a brief note explaining your reasoning."
        )));
        for frame in selected {
            parts.push(PromptPart::ImagePng(encode_png(frame).await?));
        }

        let reply = self.client.complete(&parts).await?;
        Ok(StepVerdict {
            observed: reply.contains("Observed"),
            notes: reply,
        })
    }
}

/// Uniform nearest-index sub-sampling down to `cap` frames.
///
/// The window allocator already caps step windows; this is a second,
/// independent guard on the verifier input itself.
fn subsample(frames: &[Frame], cap: usize) -> Vec<&Frame> {
    if frames.len() <= cap {
        return frames.iter().collect();
    }
    let stride = frames.len() as f64 / cap as f64;
    (0..cap)
        .map(|i| {
            let index = ((i as f64 * stride).round() as usize).min(frames.len() - 1);
            &frames[index]
        })
        .collect()
}

/// PNG-encode a frame for the prompt, off the async threads.
async fn encode_png(frame: &Frame) -> AnalysisResult<Vec<u8>> {
    let image = frame.image.clone();
    tokio::task::spawn_blocking(move || -> AnalysisResult<Vec<u8>> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    })
    .await
    .map_err(|e| AnalysisError::VerifierCall(format!("image encode task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedClient {
        replies: Mutex<VecDeque<AnalysisResult<String>>>,
        image_counts: Mutex<Vec<usize>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<AnalysisResult<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                image_counts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VisionChatClient for ScriptedClient {
        async fn complete(&self, parts: &[PromptPart]) -> AnalysisResult<String> {
            let images = parts
                .iter()
                .filter(|p| matches!(p, PromptPart::ImagePng(_)))
                .count();
            self.image_counts.lock().unwrap().push(images);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("Deviation - no reply scripted".to_string()))
        }
    }

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::new(i as f64, RgbImage::from_pixel(2, 2, Rgb([i as u8, 0, 0]))))
            .collect()
    }

    #[tokio::test]
    async fn observed_marker_in_reply_means_observed() {
        let verifier = StepVerifier::new(ScriptedClient::new(vec![Ok(
            "Observed - the submit button is pressed in frame 3".to_string(),
        )]));
        let verdict = verifier.verify_step("Click submit", &frames(3)).await;
        assert!(verdict.observed);
        assert!(verdict.notes.contains("frame 3"));
    }

    #[tokio::test]
    async fn reply_without_marker_is_a_deviation() {
        let verifier = StepVerifier::new(ScriptedClient::new(vec![Ok(
            "Deviation - nothing matching the step is visible".to_string(),
        )]));
        let verdict = verifier.verify_step("Open settings", &frames(2)).await;
        assert!(!verdict.observed);
    }

    #[tokio::test]
    async fn call_failure_maps_to_error_note() {
        let verifier = StepVerifier::new(ScriptedClient::new(vec![Err(
            AnalysisError::VerifierCall("connection reset".to_string()),
        )]));
        let verdict = verifier.verify_step("Open app", &frames(1)).await;
        assert!(!verdict.observed);
        assert!(verdict.notes.starts_with("Error: "));
        assert!(verdict.notes.contains("connection reset"));
    }

    #[tokio::test]
    async fn empty_window_is_a_deviation_without_a_model_call() {
        let client = ScriptedClient::new(vec![]);
        let verifier = StepVerifier::new(client);
        let verdict = verifier.verify_step("Open app", &[]).await;
        assert!(!verdict.observed);
        assert!(verdict.notes.contains("No frames"));
        assert!(verifier.client.image_counts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_input_is_subsampled_to_the_cap() {
        let verifier = StepVerifier::new(ScriptedClient::new(vec![Ok("Observed".to_string())]));
        let verdict = verifier.verify_step("Scroll down", &frames(50)).await;
        assert!(verdict.observed);
        let counts = verifier.client.image_counts.lock().unwrap();
        assert_eq!(counts.as_slice(), &[WINDOW_CAP]);
    }

    #[tokio::test]
    async fn blank_reply_yes_is_blank() {
        let verifier = StepVerifier::new(ScriptedClient::new(vec![
            Ok("Yes".to_string()),
            Ok("  yes, entirely white".to_string()),
            Ok("No".to_string()),
        ]));
        let frame = &frames(1)[0];
        assert!(verifier.is_blank(frame).await.unwrap());
        assert!(verifier.is_blank(frame).await.unwrap());
        assert!(!verifier.is_blank(frame).await.unwrap());
    }

    #[test]
    fn subsample_covers_the_range_within_bounds() {
        let all = frames(45);
        let picked = subsample(&all, WINDOW_CAP);
        assert_eq!(picked.len(), WINDOW_CAP);
        // First pick is the first frame; every pick is in bounds and
        // ordered.
        assert_eq!(picked[0].timestamp, 0.0);
        for pair in picked.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert!(picked.last().unwrap().timestamp <= 44.0);
    }

    #[test]
    fn subsample_is_identity_at_or_below_cap() {
        let all = frames(WINDOW_CAP);
        assert_eq!(subsample(&all, WINDOW_CAP).len(), WINDOW_CAP);
        let few = frames(3);
        assert_eq!(subsample(&few, WINDOW_CAP).len(), 3);
    }
}
