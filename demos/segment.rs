use std::f32::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;

use showtape_rs::{
    channel_map, render_segment, BlendshapeFrame, BlendshapeSequence, ChannelMap,
    CoefficientProvider, EffectProvider, Fragment, ProviderError, RenderConfigBuilder,
    SampleBuffer, ScriptEvent, SpeechProvider,
};

/// Stand-in speech model: a 220 Hz tone, 80 ms per word.
struct ToneSpeech {
    sample_rate: u32,
}

impl SpeechProvider for ToneSpeech {
    fn synthesize(&mut self, sentence: &str) -> Result<SampleBuffer, ProviderError> {
        let words = sentence.split_whitespace().count().max(1);
        let n = (words as f64 * 0.08 * f64::from(self.sample_rate)).round() as usize;
        let samples = (0..n)
            .map(|i| 0.3 * (TAU * 220.0 * i as f32 / self.sample_rate as f32).sin())
            .collect();
        Ok(SampleBuffer::new(samples, self.sample_rate))
    }
}

/// Stand-in effect model: band-limited-ish noise from a tiny LCG.
struct NoiseEffects {
    sample_rate: u32,
    state: u32,
}

impl EffectProvider for NoiseEffects {
    fn effect(
        &mut self,
        _effect_id: &str,
        target_duration_sec: f64,
    ) -> Result<SampleBuffer, ProviderError> {
        let n = (target_duration_sec * f64::from(self.sample_rate)).round() as usize;
        let samples = (0..n)
            .map(|_| {
                self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (self.state >> 16) as f32 / 32_768.0 - 1.0
            })
            .map(|s| s * 0.2)
            .collect();
        Ok(SampleBuffer::new(samples, self.sample_rate))
    }
}

/// Stand-in coefficient model: a jaw that opens and closes per fragment.
struct JawFlap {
    fps: u32,
    channels: ChannelMap,
}

impl CoefficientProvider for JawFlap {
    fn coefficients(&mut self, fragment: &Fragment) -> Result<BlendshapeSequence, ProviderError> {
        let frames = (fragment.duration_sec * f64::from(self.fps)).round() as usize;
        let mut sequence = Vec::with_capacity(frames);
        for i in 0..frames {
            let jaw = (TAU * 4.0 * i as f32 / self.fps as f32).sin().abs();
            sequence.push(BlendshapeFrame {
                values: vec![jaw, 0.0],
            });
        }
        Ok(BlendshapeSequence::new(sequence, self.channels.clone()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = RenderConfigBuilder::default()
        .character("walter".to_string())
        .build()?;

    let events = vec![
        ScriptEvent::SoundEffect {
            effect: "INTRO_MUSIC".to_string(),
            duration_sec: 3.0,
        },
        ScriptEvent::Dialogue {
            text: "Good evening everybody! Welcome back to the show. \
                   Tonight we have a truly strange one."
                .to_string(),
            motion: Some("wave".to_string()),
        },
        ScriptEvent::SoundEffect {
            effect: "LAUGHTER".to_string(),
            duration_sec: 2.0,
        },
        ScriptEvent::Dialogue {
            text: "Thank you. Thank you very much.".to_string(),
            motion: None,
        },
        ScriptEvent::SoundEffect {
            effect: "APPLAUSE".to_string(),
            duration_sec: 3.0,
        },
    ];

    let mut speech = ToneSpeech {
        sample_rate: config.sample_rate,
    };
    let mut effects = NoiseEffects {
        sample_rate: config.sample_rate,
        state: 0x5eed,
    };
    let mut coefficients = JawFlap {
        fps: config.fps,
        channels: channel_map(["jawOpen", "mouthSmileLeft"]),
    };

    let start = Instant::now();
    let render = render_segment(&events, &mut speech, &mut effects, &mut coefficients, &config)?;
    println!(
        "Rendered {:.2}s segment ({} fragments) in {:.2?}",
        render.total_duration_sec,
        render.fragments.len(),
        start.elapsed()
    );

    render.audio.write_wav(&PathBuf::from("segment.wav"))?;
    println!("Saved mixdown to segment.wav");

    if let Some(animation) = &render.animation {
        animation.write_json(&PathBuf::from("animation.json"))?;
        println!(
            "Saved {} blendshape frames for {:?} to animation.json",
            animation.blendshapes.len(),
            animation.character
        );
    }

    Ok(())
}
