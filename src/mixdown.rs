//! Track assembly and final mixdown.
//!
//! Fragments arrive already positioned by the timeline builder; silences are
//! the gaps between their positions. Each track is rendered into a zeroed
//! buffer, the shorter track is padded to the longer (never truncated), the
//! two are summed, and the sum is soft-clipped to bound amplitude.

use crate::buffer::{SampleBuffer, SampleRateMismatch};
use crate::timeline::{Fragment, Timeline};

/// The combined voice + effect waveform of one segment.
#[derive(Debug, Clone)]
pub struct Mixdown {
    pub samples: SampleBuffer,
    pub total_duration_sec: f64,
}

/// Render one track: zero-fill to the cursor's end, then add each fragment
/// at `round(start * rate)`.
fn render_track<'a>(
    fragments: impl Iterator<Item = &'a Fragment>,
    elapsed_sec: f64,
    sample_rate: u32,
) -> Result<SampleBuffer, SampleRateMismatch> {
    let mut track = SampleBuffer::silence(elapsed_sec, sample_rate);
    for fragment in fragments {
        let offset = (fragment.start_sec * f64::from(sample_rate)).round() as usize;
        track.add_at(offset, &fragment.samples)?;
    }
    Ok(track)
}

/// Mix the two finished tracks into one buffer and report total duration.
pub fn mix_down(timeline: &Timeline) -> Result<Mixdown, SampleRateMismatch> {
    let rate = timeline.sample_rate();
    let voice = render_track(
        timeline.fragments.iter().filter(|f| f.is_speech()),
        timeline.voice_elapsed_sec,
        rate,
    )?;
    let mut mixed = render_track(
        timeline.fragments.iter().filter(|f| !f.is_speech()),
        timeline.effect_elapsed_sec,
        rate,
    )?;

    // mix_in pads the shorter side, so neither track is ever cut.
    mixed.mix_in(&voice)?;
    mixed.soft_clip();

    let total_duration_sec = mixed.duration_secs();
    log::debug!(
        "mixdown: voice={:.3}s effects={:.3}s total={:.3}s",
        voice.duration_secs(),
        timeline.effect_elapsed_sec,
        total_duration_sec
    );

    Ok(Mixdown {
        samples: mixed,
        total_duration_sec,
    })
}
