//! Step-to-frame window allocation

use std::ops::Range;

/// Maximum number of frames submitted to the verifier for one step
pub const WINDOW_CAP: usize = 20;

/// Compute the frame window for each step.
///
/// With few frames (or a single step) every step sees the whole set.
/// Otherwise windows slide across the full range so early steps see
/// early frames and late steps see late frames, overlapping when there
/// are many steps relative to frames. End clamping keeps every window
/// at exactly `min(WINDOW_CAP, frame_count)` frames and never past the
/// last frame. Deterministic: same inputs, same windows.
pub fn allocate(frame_count: usize, step_count: usize) -> Vec<Range<usize>> {
    if step_count == 0 {
        return Vec::new();
    }

    if frame_count <= WINDOW_CAP || step_count == 1 {
        return vec![0..frame_count; step_count];
    }

    let stride = ((frame_count - WINDOW_CAP) / (step_count - 1)).max(1);

    (0..step_count)
        .map(|i| {
            let mut start = i * stride;
            let mut end = start + WINDOW_CAP;
            if end > frame_count {
                end = frame_count;
                start = end.saturating_sub(WINDOW_CAP);
            }
            start..end
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn no_steps_no_windows() {
        assert!(allocate(100, 0).is_empty());
    }

    #[test_case(0, 3; "no frames")]
    #[test_case(5, 2; "fewer frames than cap")]
    #[test_case(20, 4; "exactly the cap")]
    fn small_sets_use_the_full_range(frames: usize, steps: usize) {
        let windows = allocate(frames, steps);
        assert_eq!(windows.len(), steps);
        for window in windows {
            assert_eq!(window, 0..frames);
        }
    }

    #[test]
    fn single_step_always_sees_everything() {
        assert_eq!(allocate(500, 1), vec![0..500]);
    }

    #[test_case(21, 2)]
    #[test_case(50, 3)]
    #[test_case(100, 7)]
    #[test_case(23, 40; "more steps than surplus frames")]
    #[test_case(1000, 2; "large stride")]
    fn sliding_windows_have_exact_cap_length(frames: usize, steps: usize) {
        let windows = allocate(frames, steps);
        assert_eq!(windows.len(), steps);
        for window in &windows {
            assert_eq!(window.len(), WINDOW_CAP.min(frames));
            assert!(window.end <= frames);
        }
    }

    #[test_case(21, 2)]
    #[test_case(50, 3)]
    #[test_case(100, 7)]
    #[test_case(23, 40)]
    fn starts_are_non_decreasing(frames: usize, steps: usize) {
        let windows = allocate(frames, steps);
        for pair in windows.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn stride_spreads_windows_across_the_range() {
        // 100 frames, 5 steps: stride = (100 - 20) / 4 = 20.
        let windows = allocate(100, 5);
        assert_eq!(windows[0], 0..20);
        assert_eq!(windows[1], 20..40);
        assert_eq!(windows[4], 80..100);
    }

    #[test]
    fn trailing_windows_clamp_to_the_end() {
        // 30 frames, 3 steps: stride = (30 - 20) / 2 = 5.
        let windows = allocate(30, 3);
        assert_eq!(windows[0], 0..20);
        assert_eq!(windows[1], 5..25);
        assert_eq!(windows[2], 10..30);

        // 22 frames, 12 steps: stride stays at 1, late windows pile
        // up against the end.
        let windows = allocate(22, 12);
        assert_eq!(windows[0], 0..20);
        assert_eq!(windows[2], 2..22);
        assert_eq!(windows[11], 2..22);
    }

    #[test]
    fn allocation_is_deterministic() {
        assert_eq!(allocate(137, 9), allocate(137, 9));
    }
}
