//! Deterministic stub providers shared by the unit tests.

use crate::blendshape::{channel_map, BlendshapeFrame, BlendshapeSequence, ChannelMap};
use crate::buffer::SampleBuffer;
use crate::timeline::Fragment;
use crate::{CoefficientProvider, EffectProvider, ProviderError, SpeechProvider};

/// Synthesizes every sentence as `duration_sec` of constant 0.1 amplitude.
pub struct FixedSpeech {
    duration_sec: f64,
    sample_rate: u32,
}

impl FixedSpeech {
    pub fn new(duration_sec: f64, sample_rate: u32) -> Self {
        Self {
            duration_sec,
            sample_rate,
        }
    }
}

impl SpeechProvider for FixedSpeech {
    fn synthesize(&mut self, _sentence: &str) -> Result<SampleBuffer, ProviderError> {
        let n = (self.duration_sec * f64::from(self.sample_rate)).round() as usize;
        Ok(SampleBuffer::new(vec![0.1; n], self.sample_rate))
    }
}

/// Fails every synthesis request, for error-propagation tests.
pub struct UnreachableSpeech;

impl SpeechProvider for UnreachableSpeech {
    fn synthesize(&mut self, _sentence: &str) -> Result<SampleBuffer, ProviderError> {
        Err("speech model unreachable".into())
    }
}

/// Serves every effect as exact-length silence.
pub struct SilentEffects {
    sample_rate: u32,
}

impl SilentEffects {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl EffectProvider for SilentEffects {
    fn effect(
        &mut self,
        _effect_id: &str,
        target_duration_sec: f64,
    ) -> Result<SampleBuffer, ProviderError> {
        Ok(SampleBuffer::silence(target_duration_sec, self.sample_rate))
    }
}

/// Serves every effect as exact-length constant-amplitude audio.
pub struct ToneEffects {
    amplitude: f32,
    sample_rate: u32,
}

impl ToneEffects {
    pub fn new(amplitude: f32, sample_rate: u32) -> Self {
        Self {
            amplitude,
            sample_rate,
        }
    }
}

impl EffectProvider for ToneEffects {
    fn effect(
        &mut self,
        _effect_id: &str,
        target_duration_sec: f64,
    ) -> Result<SampleBuffer, ProviderError> {
        let n = (target_duration_sec * f64::from(self.sample_rate)).round() as usize;
        Ok(SampleBuffer::new(vec![self.amplitude; n], self.sample_rate))
    }
}

/// Produces `round(duration * fps)` frames of 1.0 per fragment, all under
/// one shared channel map.
pub struct ExactCoefficients {
    fps: u32,
    channels: ChannelMap,
}

impl ExactCoefficients {
    pub fn new(fps: u32) -> Self {
        Self {
            fps,
            channels: channel_map(["jawOpen", "mouthSmileLeft", "mouthSmileRight"]),
        }
    }
}

impl CoefficientProvider for ExactCoefficients {
    fn coefficients(&mut self, fragment: &Fragment) -> Result<BlendshapeSequence, ProviderError> {
        let frames = (fragment.duration_sec * f64::from(self.fps)).round() as usize;
        Ok(BlendshapeSequence::new(
            vec![
                BlendshapeFrame {
                    values: vec![1.0; self.channels.len()],
                };
                frames
            ],
            self.channels.clone(),
        ))
    }
}
