//! The dual-track timeline builder.
//!
//! Walks an ordered script and positions every emitted audio fragment on one
//! of two tracks — voice and sound effects — keeping the two running cursors
//! reconciled after every event. Event durations are unknown until the
//! providers return audio, so all positioning happens here, in event order.

use crate::buffer::{SampleBuffer, SampleRateMismatch};
use crate::config::RenderConfig;
use crate::script::{split_sentences, ScriptEvent};
use crate::{EffectProvider, ProviderError, SpeechProvider};

/// Which track a fragment belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// A synthesized dialogue sentence (voice track).
    Speech,
    /// A sound-effect cue (effect track), tagged with its effect id.
    Effect(String),
}

/// One emitted, time-positioned unit of audio. Never mutated after creation.
///
/// `start_sec` is voice-track-relative for speech fragments and
/// effect-track-relative for effect fragments.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub start_sec: f64,
    pub kind: FragmentKind,
    pub samples: SampleBuffer,
    pub duration_sec: f64,
    /// Sentence text for speech, `*EFFECT_ID*` for effects.
    pub label: String,
    /// Body-motion tag consumed by the animation stage.
    pub motion: Option<String>,
}

impl Fragment {
    pub fn is_speech(&self) -> bool {
        self.kind == FragmentKind::Speech
    }
}

/// A finished timeline: the ordered fragments plus the final cursor values.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub fragments: Vec<Fragment>,
    /// Total voice-track elapsed time.
    pub voice_elapsed_sec: f64,
    /// Total effect-track elapsed time.
    pub effect_elapsed_sec: f64,
    sample_rate: u32,
}

impl Timeline {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The speech fragments, in emission order.
    pub fn speech_fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter().filter(|f| f.is_speech())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TimelineError {
    #[error("unknown sound effect {0:?}: not present in the effect table")]
    UnknownEffect(String),
    #[error("provider returned {actual} Hz audio, build runs at {expected} Hz")]
    SampleRate { expected: u32, actual: u32 },
    #[error("speech synthesis failed for {sentence:?}")]
    Speech {
        sentence: String,
        #[source]
        source: ProviderError,
    },
    #[error("sound effect generation failed for {effect:?}")]
    Effect {
        effect: String,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Buffer(#[from] SampleRateMismatch),
}

/// Builds a [`Timeline`] from an ordered [`ScriptEvent`] sequence.
///
/// Cursor state is local to one build and discarded afterwards; a builder is
/// consumed by [`TimelineBuilder::build`].
pub struct TimelineBuilder<'a> {
    config: &'a RenderConfig,
    fragments: Vec<Fragment>,
    voice_elapsed_sec: f64,
    effect_elapsed_sec: f64,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            config,
            fragments: Vec::new(),
            voice_elapsed_sec: 0.0,
            effect_elapsed_sec: 0.0,
        }
    }

    /// Process every event in order and return the finished timeline.
    ///
    /// After each dialogue event the two cursors are equal; after each effect
    /// event the effect cursor leads by the unpaused remainder of the effect,
    /// paid down by the next dialogue's reconciliation pause.
    pub fn build<S, E>(
        mut self,
        events: &[ScriptEvent],
        speech: &mut S,
        effects: &mut E,
    ) -> Result<Timeline, TimelineError>
    where
        S: SpeechProvider,
        E: EffectProvider,
    {
        for event in events {
            match event {
                ScriptEvent::Dialogue { text, motion } => {
                    self.push_dialogue(text, motion.as_deref(), speech)?;
                }
                ScriptEvent::SoundEffect {
                    effect,
                    duration_sec,
                } => {
                    self.push_effect(effect, *duration_sec, effects)?;
                }
            }
            log::debug!(
                "cursors after event: voice={:.3}s effect={:.3}s",
                self.voice_elapsed_sec,
                self.effect_elapsed_sec
            );
        }

        Ok(Timeline {
            fragments: self.fragments,
            voice_elapsed_sec: self.voice_elapsed_sec,
            effect_elapsed_sec: self.effect_elapsed_sec,
            sample_rate: self.config.sample_rate,
        })
    }

    fn check_rate(&self, buffer: &SampleBuffer) -> Result<(), TimelineError> {
        if buffer.sample_rate() != self.config.sample_rate {
            return Err(TimelineError::SampleRate {
                expected: self.config.sample_rate,
                actual: buffer.sample_rate(),
            });
        }
        Ok(())
    }

    /// One speech fragment per sentence, then a reconciliation pause that
    /// brings the effect cursor exactly level with the voice cursor.
    fn push_dialogue<S: SpeechProvider>(
        &mut self,
        text: &str,
        motion: Option<&str>,
        speech: &mut S,
    ) -> Result<(), TimelineError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            log::debug!("dialogue produced no sentences, skipping");
            return Ok(());
        }

        for sentence in sentences {
            let mut samples =
                speech
                    .synthesize(&sentence)
                    .map_err(|source| TimelineError::Speech {
                        sentence: sentence.clone(),
                        source,
                    })?;
            self.check_rate(&samples)?;
            samples.append(&SampleBuffer::silence(
                self.config.sentence_pad_sec,
                self.config.sample_rate,
            ))?;

            let duration_sec = samples.duration_secs();
            self.fragments.push(Fragment {
                start_sec: self.voice_elapsed_sec,
                kind: FragmentKind::Speech,
                samples,
                duration_sec,
                label: sentence,
                motion: motion.map(str::to_string),
            });
            self.voice_elapsed_sec += duration_sec;
        }

        // Reconciliation: the effect track waits out any remaining skew.
        // Assigning max() instead of adding the clamped difference keeps the
        // post-dialogue equality exact in floating point.
        let pause_sec = (self.voice_elapsed_sec - self.effect_elapsed_sec).max(0.0);
        log::debug!("reconciliation pause: {pause_sec:.3}s");
        self.effect_elapsed_sec = self.effect_elapsed_sec.max(self.voice_elapsed_sec);
        Ok(())
    }

    /// One effect fragment on the effect track and a voice-side pause of
    /// `pause_fraction * duration`, so speech resumes before long reactions
    /// finish tailing off.
    fn push_effect<E: EffectProvider>(
        &mut self,
        effect_id: &str,
        duration_sec: f64,
        effects: &mut E,
    ) -> Result<(), TimelineError> {
        let spec = self
            .config
            .effects
            .get(effect_id)
            .ok_or_else(|| TimelineError::UnknownEffect(effect_id.to_string()))?;

        let samples = effects
            .effect(effect_id, duration_sec)
            .map_err(|source| TimelineError::Effect {
                effect: effect_id.to_string(),
                source,
            })?;
        self.check_rate(&samples)?;

        let actual_duration_sec = samples.duration_secs();
        self.fragments.push(Fragment {
            start_sec: self.effect_elapsed_sec,
            kind: FragmentKind::Effect(effect_id.to_string()),
            samples,
            duration_sec: actual_duration_sec,
            label: format!("*{effect_id}*"),
            motion: None,
        });

        self.effect_elapsed_sec += duration_sec;
        self.voice_elapsed_sec += duration_sec * spec.pause_fraction;
        Ok(())
    }
}
