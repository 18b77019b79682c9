//! # showtape-rs
//!
//! A Rust library for assembling independently generated speech, sound
//! effects, and facial-animation coefficients into one frame-accurate,
//! dual-track broadcast segment.
//!
//! ## Features
//!
//! - **Dual-track timeline**: a voice track and an effect track stay
//!   mutually synchronized even though every event's audio length is only
//!   known once a model returns it
//! - **Deterministic assembly**: silence insertion, padding, and truncation
//!   policies are exact, so a build reproduces bit-identically given the
//!   same model outputs
//! - **Frame-exact animation**: per-sentence blendshape sequences are merged
//!   into one gap-filled track whose length always equals
//!   `round(total_duration * fps)`
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! showtape-rs = "0.1"
//! ```
//!
//! ```ignore
//! use showtape_rs::{render_segment, RenderConfigBuilder, ScriptEvent};
//!
//! let config = RenderConfigBuilder::default().character("walter".to_string()).build()?;
//! let events = vec![
//!     ScriptEvent::SoundEffect { effect: "INTRO_MUSIC".to_string(), duration_sec: 4.0 },
//!     ScriptEvent::Dialogue { text: "Good evening!".to_string(), motion: None },
//!     ScriptEvent::SoundEffect { effect: "APPLAUSE".to_string(), duration_sec: 3.0 },
//! ];
//!
//! let render = render_segment(&events, &mut speech, &mut effects, &mut coefficients, &config)?;
//! render.audio.write_wav(&std::path::PathBuf::from("segment.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The three `&mut` collaborators are the model boundaries: anything
//! implementing [`SpeechProvider`], [`EffectProvider`], and
//! [`CoefficientProvider`]. The crate ships one concrete provider,
//! [`EffectLibrary`], which serves sound effects from WAV files on disk.

pub mod blendshape;
pub mod buffer;
pub mod config;
pub mod library;
pub mod mixdown;
pub mod render;
pub mod script;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;

pub use blendshape::{
    channel_map, merge_coefficients, BlendshapeFrame, BlendshapeSequence, ChannelMap,
    FragmentCoefficients, MergeError,
};
pub use buffer::{FadeShape, SampleBuffer, SampleRateMismatch};
pub use config::{
    EffectSpec, EffectTable, RenderConfig, RenderConfigBuilder, RenderConfigBuilderError,
};
pub use library::{EffectLibrary, LibraryError};
pub use mixdown::{mix_down, Mixdown};
pub use render::{
    render_segment, AnimationTrack, AnimationWriteError, RenderError, SegmentRender,
};
pub use script::{split_sentences, ScriptEvent};
pub use timeline::{Fragment, FragmentKind, Timeline, TimelineBuilder, TimelineError};

/// Boxed error surface shared by all provider trait boundaries.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Speech synthesis boundary: one sentence in, mono audio out.
///
/// Implementations must return audio at the process-wide sample rate;
/// resampling is the provider's responsibility. Calls may be slow (model
/// inference) and are made in sentence order.
pub trait SpeechProvider {
    fn synthesize(&mut self, sentence: &str) -> Result<SampleBuffer, ProviderError>;
}

/// Sound effect boundary: returns audio of exactly `target_duration_sec`
/// at the process sample rate, trimming with a fade or looping as needed.
pub trait EffectProvider {
    fn effect(
        &mut self,
        effect_id: &str,
        target_duration_sec: f64,
    ) -> Result<SampleBuffer, ProviderError>;
}

/// Animation coefficient boundary: one speech fragment in, one
/// [`BlendshapeSequence`] out, at a fixed fps and a globally shared
/// channel mapping. The frame count is not guaranteed to be exact; the
/// merge engine reconciles it.
pub trait CoefficientProvider {
    fn coefficients(&mut self, fragment: &Fragment) -> Result<BlendshapeSequence, ProviderError>;
}
