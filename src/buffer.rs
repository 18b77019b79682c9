//! Fixed-rate mono sample buffers.
//!
//! Every buffer in one build shares the process-wide sample rate; any
//! operation that would combine two rates fails with [`SampleRateMismatch`]
//! instead of silently resampling.

use std::path::Path;

/// Two buffers with different sample rates were combined.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sample rate mismatch: {left} Hz vs {right} Hz")]
pub struct SampleRateMismatch {
    pub left: u32,
    pub right: u32,
}

/// Volume envelope applied when fitting a buffer to a target duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeShape {
    /// Unity gain throughout (music, silence).
    Flat,
    /// Linear fade from full volume down to zero over the whole duration
    /// (applause, laughter, crowd reactions).
    LinearOut,
}

impl FadeShape {
    /// Gain for sample `i` of `n`.
    fn gain(self, i: usize, n: usize) -> f32 {
        match self {
            FadeShape::Flat => 1.0,
            FadeShape::LinearOut => {
                if n <= 1 {
                    1.0
                } else {
                    1.0 - i as f32 / (n - 1) as f32
                }
            }
        }
    }
}

/// A mono f32 signal at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A buffer of `round(duration_sec * sample_rate)` zero samples.
    pub fn silence(duration_sec: f64, sample_rate: u32) -> Self {
        let n = (duration_sec * f64::from(sample_rate)).round() as usize;
        Self {
            samples: vec![0.0; n],
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Append another buffer's samples after this one.
    pub fn append(&mut self, other: &SampleBuffer) -> Result<(), SampleRateMismatch> {
        if self.sample_rate != other.sample_rate {
            return Err(SampleRateMismatch {
                left: self.sample_rate,
                right: other.sample_rate,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Extend with trailing zeros up to `len` samples. Never truncates.
    pub fn pad_to(&mut self, len: usize) {
        if self.samples.len() < len {
            self.samples.resize(len, 0.0);
        }
    }

    /// Fit this buffer to exactly `round(duration_sec * rate)` samples,
    /// truncating a longer signal or tiling a shorter one, then apply the
    /// fade envelope across the full target length.
    ///
    /// An empty source yields plain silence of the target length.
    pub fn fit_to_duration(&self, duration_sec: f64, fade: FadeShape) -> SampleBuffer {
        let target = (duration_sec * f64::from(self.sample_rate)).round() as usize;
        if self.samples.is_empty() || target == 0 {
            return SampleBuffer {
                samples: vec![0.0; target],
                sample_rate: self.sample_rate,
            };
        }

        let mut fitted = Vec::with_capacity(target);
        while fitted.len() < target {
            let remaining = target - fitted.len();
            let take = remaining.min(self.samples.len());
            fitted.extend_from_slice(&self.samples[..take]);
        }

        for (i, sample) in fitted.iter_mut().enumerate() {
            *sample *= fade.gain(i, target);
        }

        SampleBuffer {
            samples: fitted,
            sample_rate: self.sample_rate,
        }
    }

    /// Soft-clip every sample with `atan` to bound the summed amplitude.
    pub fn soft_clip(&mut self) {
        for sample in &mut self.samples {
            *sample = sample.atan();
        }
    }

    /// Add another buffer sample-wise, extending this one if the other is
    /// longer. Neither signal is truncated.
    pub fn mix_in(&mut self, other: &SampleBuffer) -> Result<(), SampleRateMismatch> {
        self.add_at(0, other)
    }

    /// Add another buffer sample-wise starting at sample `offset`, growing
    /// this buffer as needed. Neither signal is truncated.
    pub fn add_at(&mut self, offset: usize, other: &SampleBuffer) -> Result<(), SampleRateMismatch> {
        if self.sample_rate != other.sample_rate {
            return Err(SampleRateMismatch {
                left: self.sample_rate,
                right: other.sample_rate,
            });
        }
        self.pad_to(offset + other.samples.len());
        for (dst, src) in self.samples[offset..].iter_mut().zip(&other.samples) {
            *dst += src;
        }
        Ok(())
    }

    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::{FadeShape, SampleBuffer};

    #[test]
    fn silence_has_rounded_sample_count() {
        let buf = SampleBuffer::silence(0.25, 24_000);
        assert_eq!(buf.len(), 6_000);
        assert!(buf.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn duration_round_trips_through_silence() {
        let buf = SampleBuffer::silence(1.5, 24_000);
        assert_eq!(buf.duration_secs(), 1.5);
    }

    #[test]
    fn append_rejects_mismatched_rates() {
        let mut a = SampleBuffer::silence(0.1, 24_000);
        let b = SampleBuffer::silence(0.1, 22_050);
        let err = a.append(&b).unwrap_err();
        assert_eq!(err.left, 24_000);
        assert_eq!(err.right, 22_050);
    }

    #[test]
    fn fit_truncates_long_signal_with_fade_to_zero() {
        let buf = SampleBuffer::new(vec![1.0; 48_000], 24_000);
        let fitted = buf.fit_to_duration(1.0, FadeShape::LinearOut);
        assert_eq!(fitted.len(), 24_000);
        assert_eq!(fitted.samples()[0], 1.0);
        assert_eq!(*fitted.samples().last().unwrap(), 0.0);
    }

    #[test]
    fn fit_tiles_short_signal_to_target_length() {
        let buf = SampleBuffer::new(vec![0.5, -0.5], 4);
        let fitted = buf.fit_to_duration(2.0, FadeShape::Flat);
        assert_eq!(fitted.len(), 8);
        assert_eq!(fitted.samples(), &[0.5, -0.5, 0.5, -0.5, 0.5, -0.5, 0.5, -0.5]);
    }

    #[test]
    fn fit_of_empty_source_is_silence() {
        let buf = SampleBuffer::new(vec![], 24_000);
        let fitted = buf.fit_to_duration(0.5, FadeShape::LinearOut);
        assert_eq!(fitted.len(), 12_000);
        assert!(fitted.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn soft_clip_bounds_amplitude() {
        let mut buf = SampleBuffer::new(vec![10.0, -10.0, 0.0], 24_000);
        buf.soft_clip();
        assert!(buf.samples()[0] < std::f32::consts::FRAC_PI_2);
        assert!(buf.samples()[1] > -std::f32::consts::FRAC_PI_2);
        assert_eq!(buf.samples()[2], 0.0);
    }

    #[test]
    fn mix_in_pads_to_longer_signal() {
        let mut a = SampleBuffer::new(vec![1.0, 1.0], 24_000);
        let b = SampleBuffer::new(vec![0.5, 0.5, 0.5, 0.5], 24_000);
        a.mix_in(&b).unwrap();
        assert_eq!(a.samples(), &[1.5, 1.5, 0.5, 0.5]);
    }

    #[test]
    fn add_at_places_samples_past_the_current_end() {
        let mut a = SampleBuffer::new(vec![1.0], 24_000);
        let b = SampleBuffer::new(vec![0.5, 0.5], 24_000);
        a.add_at(3, &b).unwrap();
        assert_eq!(a.samples(), &[1.0, 0.0, 0.0, 0.5, 0.5]);
    }
}
