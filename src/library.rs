//! A WAV-file-backed sound effect provider.
//!
//! Effects are registered as one or more WAV files per effect id; serving a
//! cue picks one variant at random, downmixes to mono, and fits it to the
//! requested duration with the effect's fade shape from the [`EffectTable`].
//! The id `"SILENCE"` is synthesized directly and needs no files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::buffer::SampleBuffer;
use crate::config::EffectTable;
use crate::{EffectProvider, ProviderError};

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error("effect {0:?} is not registered in the library")]
    UnknownEffect(String),
    #[error("effect {0:?} has no registered files")]
    NoFiles(String),
    #[error("effect {0:?} is missing from the effect table")]
    NoSpec(String),
    #[error("{path}: expected {expected} Hz, file is {actual} Hz")]
    SampleRate {
        path: String,
        expected: u32,
        actual: u32,
    },
    #[error("failed to read WAV: {0}")]
    Wav(#[from] hound::Error),
}

/// Serves sound effects from WAV files on disk.
pub struct EffectLibrary {
    sample_rate: u32,
    table: EffectTable,
    files: HashMap<String, Vec<PathBuf>>,
}

impl EffectLibrary {
    /// An empty library serving only `"SILENCE"`.
    pub fn new(sample_rate: u32, table: EffectTable) -> Self {
        Self {
            sample_rate,
            table,
            files: HashMap::new(),
        }
    }

    /// Register the asset variants for one effect id. Serving picks one
    /// variant at random per cue.
    pub fn register(&mut self, effect_id: &str, paths: Vec<PathBuf>) {
        self.files.insert(effect_id.to_string(), paths);
    }

    /// Decode a WAV file to a mono [`SampleBuffer`], averaging channels.
    fn load_wav(&self, path: &Path) -> Result<SampleBuffer, LibraryError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_rate != self.sample_rate {
            return Err(LibraryError::SampleRate {
                path: path.display().to_string(),
                expected: self.sample_rate,
                actual: spec.sample_rate,
            });
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let channels = spec.channels as usize;
        let samples = if channels <= 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        log::debug!(
            "loaded {} ({} samples @ {} Hz)",
            path.display(),
            samples.len(),
            spec.sample_rate
        );
        Ok(SampleBuffer::new(samples, self.sample_rate))
    }

    fn serve(&self, effect_id: &str, duration_sec: f64) -> Result<SampleBuffer, LibraryError> {
        if effect_id == "SILENCE" {
            return Ok(SampleBuffer::silence(duration_sec, self.sample_rate));
        }

        let fade = self
            .table
            .get(effect_id)
            .map(|spec| spec.fade)
            .ok_or_else(|| LibraryError::NoSpec(effect_id.to_string()))?;
        let variants = self
            .files
            .get(effect_id)
            .ok_or_else(|| LibraryError::UnknownEffect(effect_id.to_string()))?;
        let path = variants
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| LibraryError::NoFiles(effect_id.to_string()))?;

        let raw = self.load_wav(path)?;
        Ok(raw.fit_to_duration(duration_sec, fade))
    }
}

impl EffectProvider for EffectLibrary {
    fn effect(
        &mut self,
        effect_id: &str,
        target_duration_sec: f64,
    ) -> Result<SampleBuffer, ProviderError> {
        Ok(self.serve(effect_id, target_duration_sec)?)
    }
}
