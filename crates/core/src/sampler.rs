//! Frame sampling from recorded run videos
//!
//! Decoding is delegated to ffmpeg: one ffprobe pass reports the
//! stream geometry, one ffmpeg pass extracts the selected frame
//! indices as PNGs into a scratch directory. Both children are waited
//! on before returning, and the scratch directory is removed when it
//! drops, so decoder resources are released on every path.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::frame::Frame;

/// Samples one frame per fixed time interval from a video file
#[derive(Debug, Clone)]
pub struct FrameSampler {
    interval_secs: f64,
}

/// Stream geometry needed to plan the sampling pass
#[derive(Debug, Clone, Copy, PartialEq)]
struct VideoMeta {
    fps: f64,
    duration_secs: f64,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl FrameSampler {
    pub fn new(interval_secs: f64) -> Self {
        Self { interval_secs }
    }

    /// Extract one frame per interval, paired with its timestamp.
    ///
    /// A missing video file is not fatal: the run continues with zero
    /// frames and every step is judged without evidence. A video whose
    /// codec reports no usable frame rate yields zero frames as well.
    pub async fn sample(&self, video_path: &Path) -> AnalysisResult<Vec<Frame>> {
        if !video_path.exists() {
            warn!("Video not found: {}", video_path.display());
            return Ok(Vec::new());
        }

        let meta = probe(video_path).await?;
        let plan = self.plan_samples(meta);
        if plan.is_empty() {
            debug!(
                "No sample points in {} (fps {:.3}, duration {:.1}s)",
                video_path.display(),
                meta.fps,
                meta.duration_secs
            );
            return Ok(Vec::new());
        }

        let frames = extract(video_path, &plan).await?;
        debug!(
            "Sampled {} frame(s) from {}",
            frames.len(),
            video_path.display()
        );
        Ok(frames)
    }

    /// Map each integer multiple of the interval in [0, duration) to
    /// the nearest frame index.
    fn plan_samples(&self, meta: VideoMeta) -> Vec<(f64, u64)> {
        if self.interval_secs <= 0.0 {
            warn!("Non-positive sampling interval, emitting no frames");
            return Vec::new();
        }

        let mut plan: Vec<(f64, u64)> = Vec::new();
        let mut k = 0u64;
        loop {
            let t = k as f64 * self.interval_secs;
            if t >= meta.duration_secs {
                break;
            }
            let index = (t * meta.fps).round() as u64;
            // A low frame rate can map two sample times onto the same
            // frame; the first timestamp wins.
            if plan.last().map_or(true, |&(_, last)| last != index) {
                plan.push((t, index));
            }
            k += 1;
        }
        plan
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Probe the first video stream for frame rate and duration.
async fn probe(video_path: &Path) -> AnalysisResult<VideoMeta> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=avg_frame_rate,nb_frames,duration",
            "-show_entries",
            "format=duration",
            "-print_format",
            "json",
        ])
        .arg(video_path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| AnalysisError::FrameExtraction(format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::FrameExtraction(format!(
            "ffprobe exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    let container_duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());
    let stream = match parsed.streams.into_iter().next() {
        Some(stream) => stream,
        None => return Ok(VideoMeta { fps: 0.0, duration_secs: 0.0 }),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .unwrap_or(0.0);
    if fps <= 0.0 {
        // No usable frame rate: treat the stream as zero-length.
        return Ok(VideoMeta { fps: 0.0, duration_secs: 0.0 });
    }

    // Prefer the exact frame count; WebM streams often report neither
    // nb_frames nor a stream duration, so fall back to the container.
    let duration_secs = match stream.nb_frames.as_deref().and_then(|n| n.parse::<u64>().ok()) {
        Some(frame_count) => frame_count as f64 / fps,
        None => stream
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .or(container_duration)
            .unwrap_or(0.0),
    };

    Ok(VideoMeta { fps, duration_secs })
}

/// Extract the planned frame indices as PNGs in one ffmpeg pass, then
/// decode them off the async threads.
async fn extract(video_path: &Path, plan: &[(f64, u64)]) -> AnalysisResult<Vec<Frame>> {
    let scratch = tempfile::tempdir()?;
    let pattern = scratch.path().join("frame_%05d.png");

    let select = plan
        .iter()
        .map(|&(_, index)| format!("eq(n\\,{index})"))
        .collect::<Vec<_>>()
        .join("+");

    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(video_path)
        .args(["-vf", &format!("select={select}"), "-vsync", "0", "-y"])
        .arg(&pattern)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| AnalysisError::FrameExtraction(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::FrameExtraction(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let timestamps: Vec<f64> = plan.iter().map(|&(t, _)| t).collect();
    let dir = scratch.path().to_path_buf();
    let frames = tokio::task::spawn_blocking(move || load_frames(&dir, &timestamps))
        .await
        .map_err(|e| AnalysisError::FrameExtraction(format!("frame decode task failed: {e}")))??;

    Ok(frames)
}

/// Decode the extracted PNGs in output order, pairing each with its
/// planned timestamp.
fn load_frames(dir: &Path, timestamps: &[f64]) -> AnalysisResult<Vec<Frame>> {
    let mut frames = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let path = frame_path(dir, i);
        if !path.exists() {
            // ffmpeg writes fewer files when planned indices run past
            // the last frame; stop at the first gap.
            break;
        }
        let image = image::open(&path)?.to_rgb8();
        frames.push(Frame::new(timestamp, image));
    }
    Ok(frames)
}

fn frame_path(dir: &Path, i: usize) -> PathBuf {
    dir.join(format!("frame_{:05}.png", i + 1))
}

/// Parse ffprobe's rational frame rate ("30000/1001", "25/1", "0/0").
fn parse_rational(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0 && num > 0.0).then(|| num / den)
        }
        None => s.trim().parse().ok(),
    }
}

/// Log a warning when ffmpeg/ffprobe are missing from PATH. Sampling
/// cannot work without them, and the warning makes broken setups easy
/// to diagnose before the first video is touched.
pub async fn check_tools_available() {
    for tool in ["ffmpeg", "ffprobe"] {
        let found = Command::new(tool)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false);
        if !found {
            warn!("{tool} not found on PATH; video sampling will not work");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_emits_one_point_per_interval() {
        let sampler = FrameSampler::new(1.0);
        let plan = sampler.plan_samples(VideoMeta { fps: 30.0, duration_secs: 4.5 });
        assert_eq!(
            plan,
            vec![(0.0, 0), (1.0, 30), (2.0, 60), (3.0, 90), (4.0, 120)]
        );
    }

    #[test]
    fn plan_respects_custom_interval() {
        let sampler = FrameSampler::new(2.0);
        let plan = sampler.plan_samples(VideoMeta { fps: 10.0, duration_secs: 7.0 });
        assert_eq!(plan, vec![(0.0, 0), (2.0, 20), (4.0, 40), (6.0, 60)]);
    }

    #[test]
    fn zero_duration_plans_nothing() {
        let sampler = FrameSampler::new(1.0);
        assert!(sampler
            .plan_samples(VideoMeta { fps: 0.0, duration_secs: 0.0 })
            .is_empty());
    }

    #[test]
    fn low_fps_collapses_repeated_indices() {
        // At 0.4 fps, t=0s and t=1s both round to frame 0.
        let sampler = FrameSampler::new(1.0);
        let plan = sampler.plan_samples(VideoMeta { fps: 0.4, duration_secs: 5.0 });
        let indices: Vec<u64> = plan.iter().map(|&(_, i)| i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        // First timestamp wins for a shared index.
        assert_eq!(plan[0], (0.0, 0));
        assert_eq!(plan[1], (2.0, 1));
    }

    #[test]
    fn non_positive_interval_plans_nothing() {
        let sampler = FrameSampler::new(0.0);
        assert!(sampler
            .plan_samples(VideoMeta { fps: 30.0, duration_secs: 10.0 })
            .is_empty());
    }

    #[test]
    fn rational_frame_rates_parse() {
        assert_eq!(parse_rational("25/1"), Some(25.0));
        assert_eq!(parse_rational("30000/1001"), Some(30000.0 / 1001.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("24"), Some(24.0));
        assert_eq!(parse_rational("garbage"), None);
    }

    #[tokio::test]
    async fn missing_video_yields_no_frames() {
        let sampler = FrameSampler::default();
        let frames = sampler
            .sample(Path::new("/nonexistent/proofs/run.webm"))
            .await
            .unwrap();
        assert!(frames.is_empty());
    }
}
