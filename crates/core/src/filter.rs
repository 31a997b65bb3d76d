//! Blank and duplicate frame filtering

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::frame::{FilteredFrames, Frame};
use crate::verifier::{StepVerifier, VisionChatClient};

/// Drop blank frames and exact duplicates, preserving order.
///
/// Blank classification is delegated to the vision model and is
/// approximate by nature; a failed classifier call keeps the frame so
/// a transient error never discards evidence. Duplicates are detected
/// by content fingerprint, first occurrence kept.
pub async fn filter_frames<C: VisionChatClient>(
    verifier: &StepVerifier<C>,
    frames: Vec<Frame>,
) -> FilteredFrames {
    let total = frames.len();
    let mut seen = HashSet::new();
    let mut survivors = Vec::new();

    for frame in frames {
        let blank = match verifier.is_blank(&frame).await {
            Ok(blank) => blank,
            Err(e) => {
                warn!(
                    "Blank check failed at t={:.1}s, keeping frame: {e}",
                    frame.timestamp
                );
                false
            }
        };
        if blank {
            debug!("Dropping blank frame at t={:.1}s", frame.timestamp);
            continue;
        }
        if !seen.insert(frame.fingerprint()) {
            debug!("Dropping duplicate frame at t={:.1}s", frame.timestamp);
            continue;
        }
        survivors.push(frame);
    }

    info!("Non-blank unique frames: {}/{}", survivors.len(), total);
    FilteredFrames::from_vec(survivors)
}
