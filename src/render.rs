//! End-to-end segment rendering.
//!
//! Ties the core together the way the show packager drives it: build the
//! timeline, mix the tracks, then fetch and merge coefficients for the
//! speech fragments. Persistence of the outputs stays with the caller;
//! [`SampleBuffer::write_wav`] and [`AnimationTrack::write_json`] are the
//! only file helpers.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::blendshape::{merge_coefficients, BlendshapeSequence, FragmentCoefficients, MergeError};
use crate::buffer::{SampleBuffer, SampleRateMismatch};
use crate::config::RenderConfig;
use crate::mixdown::mix_down;
use crate::script::ScriptEvent;
use crate::timeline::{Fragment, Timeline, TimelineBuilder, TimelineError};
use crate::{CoefficientProvider, EffectProvider, ProviderError, SpeechProvider};

/// The merged animation track for one character.
#[derive(Debug, Clone, Serialize)]
pub struct AnimationTrack {
    pub character: String,
    pub fps: u32,
    pub absolute_start_time_sec: f64,
    pub blendshapes: BlendshapeSequence,
}

impl AnimationTrack {
    /// Write the track as JSON for the scene-construction stage.
    pub fn write_json(&self, path: &Path) -> Result<(), AnimationWriteError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AnimationWriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one rendered segment hands to downstream collaborators.
///
/// `animation` is `None` when the script contained no dialogue; an absent
/// track is valid and distinct from an empty one.
#[derive(Debug)]
pub struct SegmentRender {
    pub audio: SampleBuffer,
    pub total_duration_sec: f64,
    pub fragments: Vec<Fragment>,
    pub animation: Option<AnimationTrack>,
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Mixdown(#[from] SampleRateMismatch),
    #[error("coefficient generation failed for {label:?}")]
    Coefficients {
        label: String,
        #[source]
        source: ProviderError,
    },
}

/// Render one script into its mixed waveform and merged animation track.
pub fn render_segment<S, E, C>(
    events: &[ScriptEvent],
    speech: &mut S,
    effects: &mut E,
    coefficients: &mut C,
    config: &RenderConfig,
) -> Result<SegmentRender, RenderError>
where
    S: SpeechProvider,
    E: EffectProvider,
    C: CoefficientProvider,
{
    let timeline = TimelineBuilder::new(config).build(events, speech, effects)?;
    let mix = mix_down(&timeline)?;
    let animation = animation_for_timeline(&timeline, coefficients, mix.total_duration_sec, config)?;

    Ok(SegmentRender {
        audio: mix.samples,
        total_duration_sec: mix.total_duration_sec,
        fragments: timeline.fragments,
        animation,
    })
}

/// Fetch coefficients for every speech fragment and merge them; `None` when
/// the timeline has no speech at all.
fn animation_for_timeline<C: CoefficientProvider>(
    timeline: &Timeline,
    coefficients: &mut C,
    total_duration_sec: f64,
    config: &RenderConfig,
) -> Result<Option<AnimationTrack>, RenderError> {
    let mut parts = Vec::new();
    for fragment in timeline.speech_fragments() {
        let sequence =
            coefficients
                .coefficients(fragment)
                .map_err(|source| RenderError::Coefficients {
                    label: fragment.label.clone(),
                    source,
                })?;
        parts.push(FragmentCoefficients {
            start_sec: fragment.start_sec,
            duration_sec: fragment.duration_sec,
            label: fragment.label.clone(),
            sequence,
        });
    }
    if parts.is_empty() {
        log::debug!("no speech fragments, skipping animation merge");
        return Ok(None);
    }

    let blendshapes = merge_coefficients(parts, total_duration_sec, config.fps)?;
    Ok(Some(AnimationTrack {
        character: config.character.clone(),
        fps: config.fps,
        absolute_start_time_sec: 0.0,
        blendshapes,
    }))
}
