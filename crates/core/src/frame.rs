//! Sampled video frames and the filtered frame set

use std::ops::Range;

use image::RgbImage;
use sha2::{Digest, Sha256};

/// A single frame sampled from the run video
///
/// Immutable once created: produced by the sampler, consumed by the
/// filter and verifier, dropped when the run ends.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Seconds from the start of the video
    pub timestamp: f64,

    /// Decoded RGB pixel buffer
    pub image: RgbImage,
}

impl Frame {
    pub fn new(timestamp: f64, image: RgbImage) -> Self {
        Self { timestamp, image }
    }

    /// Content fingerprint over the raw pixel bytes.
    ///
    /// Used only for exact-duplicate detection; this is a content
    /// fingerprint, not a security boundary, and hash collisions are
    /// accepted. Dimensions are mixed in so equal byte streams of
    /// different geometry do not collide.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.image.width().to_le_bytes());
        hasher.update(self.image.height().to_le_bytes());
        hasher.update(self.image.as_raw());
        hex::encode(hasher.finalize())
    }
}

/// Frames that survived blank and duplicate filtering, in timestamp order
///
/// Invariants: no two frames share a fingerprint, and no frame was
/// classified blank. Built by [`crate::filter::filter_frames`]; one set
/// is owned per analysis run.
#[derive(Debug, Clone, Default)]
pub struct FilteredFrames(Vec<Frame>);

impl FilteredFrames {
    pub(crate) fn from_vec(frames: Vec<Frame>) -> Self {
        Self(frames)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The contiguous slice of frames for one step's window.
    pub fn window(&self, range: Range<usize>) -> &[Frame] {
        &self.0[range]
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.0
    }
}
