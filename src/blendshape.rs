//! Frame-quantized facial animation coefficients and the merge engine.
//!
//! Each speech fragment gets its own coefficient sequence from an external
//! provider, with no guarantee on the exact frame count. The merge walks the
//! fragments in order, zero-fills the gaps between them, and pins every
//! fragment's contribution to a cumulative rounded frame target, so the
//! final sequence length always equals `round(total_duration_sec * fps)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Channel-name-to-index mapping shared by all sequences in one build.
///
/// BTreeMap keeps the serialized mapping in a stable order.
pub type ChannelMap = BTreeMap<String, usize>;

/// Build a [`ChannelMap`] from names in index order.
pub fn channel_map<'a>(names: impl IntoIterator<Item = &'a str>) -> ChannelMap {
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), index))
        .collect()
}

/// One frame's worth of coefficient values, indexed by the channel map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlendshapeFrame {
    pub values: Vec<f32>,
}

impl BlendshapeFrame {
    /// A frame with every channel at rest.
    pub fn zeroed(channel_count: usize) -> Self {
        Self {
            values: vec![0.0; channel_count],
        }
    }
}

/// An ordered coefficient sequence plus its channel mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendshapeSequence {
    pub frames: Vec<BlendshapeFrame>,
    pub channels: ChannelMap,
}

impl BlendshapeSequence {
    pub fn new(frames: Vec<BlendshapeFrame>, channels: ChannelMap) -> Self {
        Self { frames, channels }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// One speech fragment's coefficient sequence plus its voice-track position.
#[derive(Debug, Clone)]
pub struct FragmentCoefficients {
    pub start_sec: f64,
    pub duration_sec: f64,
    /// Sentence text, used in anomaly logs.
    pub label: String,
    pub sequence: BlendshapeSequence,
}

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error("no speech fragments to merge")]
    Empty,
    #[error("channel mapping of fragment {index} ({label:?}) differs from fragment 0")]
    ChannelMapMismatch { index: usize, label: String },
    #[error("merged sequence has {actual} frames, expected {expected}")]
    FrameCount { expected: usize, actual: usize },
}

fn frames_at(sec: f64, fps: u32) -> usize {
    (sec * f64::from(fps)).round() as usize
}

/// Merge per-fragment coefficient sequences into one continuous sequence
/// covering `[0, total_duration_sec)` at `fps`.
///
/// Per fragment: zero frames fill the gap up to `round(start * fps)`, the
/// fragment's own frames follow, and the running total is truncated (with a
/// warning) or zero-padded to `round(end * fps)`. Rounding is applied to
/// cumulative positions, never to isolated deltas, so per-fragment error
/// cannot drift the final count. `total_duration_sec` must reach at least
/// the last fragment's end; the final length is checked unconditionally and
/// a mismatch is reported as [`MergeError::FrameCount`].
pub fn merge_coefficients(
    parts: Vec<FragmentCoefficients>,
    total_duration_sec: f64,
    fps: u32,
) -> Result<BlendshapeSequence, MergeError> {
    let first = parts.first().ok_or(MergeError::Empty)?;
    let channels = first.sequence.channels.clone();
    for (index, part) in parts.iter().enumerate().skip(1) {
        if part.sequence.channels != channels {
            return Err(MergeError::ChannelMapMismatch {
                index,
                label: part.label.clone(),
            });
        }
    }

    let width = channels.len();
    let expected_total = frames_at(total_duration_sec, fps);
    let mut merged: Vec<BlendshapeFrame> = Vec::with_capacity(expected_total);

    for part in parts {
        let start_frame = frames_at(part.start_sec, fps);
        let end_frame = frames_at(part.start_sec + part.duration_sec, fps);

        while merged.len() < start_frame {
            merged.push(BlendshapeFrame::zeroed(width));
        }

        merged.extend(part.sequence.frames);

        if merged.len() > end_frame {
            // Models over-produce occasionally; trim the tail and move on.
            log::warn!(
                "coefficients for {:?} over-produced {} frames, truncating",
                part.label,
                merged.len() - end_frame
            );
            merged.truncate(end_frame);
        } else {
            while merged.len() < end_frame {
                merged.push(BlendshapeFrame::zeroed(width));
            }
        }
        debug_assert_eq!(merged.len(), end_frame);
    }

    while merged.len() < expected_total {
        merged.push(BlendshapeFrame::zeroed(width));
    }

    // Downstream lip-sync depends on this exactly; never return a sequence
    // of any other length.
    if merged.len() != expected_total {
        return Err(MergeError::FrameCount {
            expected: expected_total,
            actual: merged.len(),
        });
    }

    Ok(BlendshapeSequence::new(merged, channels))
}

#[cfg(test)]
mod tests {
    use super::{
        channel_map, merge_coefficients, BlendshapeFrame, BlendshapeSequence,
        FragmentCoefficients, MergeError,
    };

    fn test_channels() -> super::ChannelMap {
        channel_map(["jawOpen", "mouthSmileLeft", "mouthSmileRight"])
    }

    fn frame(value: f32) -> BlendshapeFrame {
        BlendshapeFrame {
            values: vec![value; 3],
        }
    }

    fn part(start_sec: f64, duration_sec: f64, frames: usize) -> FragmentCoefficients {
        FragmentCoefficients {
            start_sec,
            duration_sec,
            label: format!("fragment at {start_sec}"),
            sequence: BlendshapeSequence::new(vec![frame(1.0); frames], test_channels()),
        }
    }

    #[test]
    fn channel_map_assigns_indices_in_order() {
        let map = test_channels();
        assert_eq!(map["jawOpen"], 0);
        assert_eq!(map["mouthSmileRight"], 2);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn single_fragment_with_exact_frames_keeps_them_all() {
        // 1.0s audio + 0.25s pad at 30 fps: round(1.25 * 30) = 38 frames.
        let merged = merge_coefficients(vec![part(0.0, 1.25, 38)], 1.25, 30).unwrap();
        assert_eq!(merged.len(), 38);
        assert!(merged.frames.iter().all(|f| f.values[0] == 1.0));
    }

    #[test]
    fn gap_before_a_fragment_becomes_zero_frames() {
        // Fragment ends at 1.25s, next starts at 1.75s: 15 zero frames between.
        let merged = merge_coefficients(
            vec![part(0.0, 1.25, 38), part(1.75, 1.0, 30)],
            2.75,
            30,
        )
        .unwrap();
        assert_eq!(merged.len(), frames_expected(2.75, 30));
        let gap = &merged.frames[38..53];
        assert_eq!(gap.len(), 15);
        assert!(gap.iter().all(|f| f.values.iter().all(|&v| v == 0.0)));
        assert_eq!(merged.frames[53].values[0], 1.0);
    }

    #[test]
    fn under_produced_fragment_is_zero_padded_to_expectation() {
        let merged = merge_coefficients(vec![part(0.0, 2.0, 0)], 2.0, 30).unwrap();
        assert_eq!(merged.len(), 60);
        assert!(merged
            .frames
            .iter()
            .all(|f| f.values.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn over_produced_fragment_is_truncated_to_expectation() {
        // 130% of the expected 60 frames.
        let merged = merge_coefficients(vec![part(0.0, 2.0, 78)], 2.0, 30).unwrap();
        assert_eq!(merged.len(), 60);
    }

    #[test]
    fn over_production_does_not_leak_into_the_next_fragment() {
        let merged = merge_coefficients(
            vec![part(0.0, 1.0, 45), part(1.0, 1.0, 30)],
            2.0,
            30,
        )
        .unwrap();
        assert_eq!(merged.len(), 60);
        assert_eq!(merged.frames[29].values[0], 1.0);
        assert_eq!(merged.frames[30].values[0], 1.0);
    }

    #[test]
    fn trailing_time_after_the_last_fragment_is_zero_padded() {
        let merged = merge_coefficients(vec![part(0.0, 1.0, 30)], 3.0, 30).unwrap();
        assert_eq!(merged.len(), 90);
        assert!(merged.frames[30..]
            .iter()
            .all(|f| f.values.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn fractional_fragment_boundaries_cannot_drift_the_total() {
        // Each fragment spans 10.5 frames; naive per-delta rounding would
        // emit 11 + 11 = 22 frames against a 21-frame total.
        let merged = merge_coefficients(
            vec![part(0.0, 0.35, 11), part(0.35, 0.35, 11)],
            0.7,
            30,
        )
        .unwrap();
        assert_eq!(merged.len(), 21);
    }

    #[test]
    fn merge_is_idempotent_for_identical_inputs() {
        let parts = vec![part(0.0, 1.25, 38), part(1.75, 1.0, 25)];
        let first = merge_coefficients(parts.clone(), 2.75, 30).unwrap();
        let second = merge_coefficients(parts, 2.75, 30).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_channel_maps_are_fatal() {
        let mut other = part(1.25, 1.0, 30);
        other.sequence.channels = channel_map(["browDownLeft", "browDownRight"]);
        other.sequence.frames = vec![frame(1.0); 30];
        let err = merge_coefficients(vec![part(0.0, 1.25, 38), other], 2.25, 30).unwrap_err();
        assert!(matches!(
            err,
            MergeError::ChannelMapMismatch { index: 1, .. }
        ));
    }

    #[test]
    fn empty_fragment_list_is_rejected() {
        let err = merge_coefficients(vec![], 1.0, 30).unwrap_err();
        assert!(matches!(err, MergeError::Empty));
    }

    #[test]
    fn total_shorter_than_the_fragments_is_a_frame_count_error() {
        let err = merge_coefficients(vec![part(0.0, 2.0, 60)], 1.0, 30).unwrap_err();
        assert!(matches!(
            err,
            MergeError::FrameCount {
                expected: 30,
                actual: 60
            }
        ));
    }

    fn frames_expected(sec: f64, fps: u32) -> usize {
        (sec * f64::from(fps)).round() as usize
    }
}
