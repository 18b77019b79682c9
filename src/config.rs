//! Build configuration: sample rate, pacing constants, and the effect table.

use std::collections::HashMap;

use derive_builder::Builder;

use crate::buffer::FadeShape;

/// How one sound-effect kind behaves on the timeline.
///
/// `pause_fraction` is the share of the effect's duration the voice track
/// waits through before the next line starts; the remainder plays under the
/// following dialogue. `fade` is the volume envelope applied when the effect
/// asset is fitted to the requested duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSpec {
    pub pause_fraction: f64,
    pub fade: FadeShape,
}

/// Lookup table from effect id to its [`EffectSpec`].
///
/// Adding a new effect is a table entry; an id missing from the table is a
/// configuration error at build time, never a silent fallback.
#[derive(Debug, Clone)]
pub struct EffectTable {
    specs: HashMap<String, EffectSpec>,
}

impl EffectTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    /// The built-in broadcast effects.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("SILENCE", EffectSpec { pause_fraction: 1.0, fade: FadeShape::Flat });
        table.insert("INTRO_MUSIC", EffectSpec { pause_fraction: 1.0, fade: FadeShape::Flat });
        table.insert("APPLAUSE", EffectSpec { pause_fraction: 0.9, fade: FadeShape::LinearOut });
        table.insert("LAUGHTER", EffectSpec { pause_fraction: 0.5, fade: FadeShape::LinearOut });
        table.insert("CROWD_AWW", EffectSpec { pause_fraction: 0.8, fade: FadeShape::LinearOut });
        table.insert("CROWD_OOH", EffectSpec { pause_fraction: 0.8, fade: FadeShape::LinearOut });
        table
    }

    pub fn insert(&mut self, effect_id: &str, spec: EffectSpec) {
        self.specs.insert(effect_id.to_string(), spec);
    }

    pub fn get(&self, effect_id: &str) -> Option<&EffectSpec> {
        self.specs.get(effect_id)
    }
}

impl Default for EffectTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Configuration for one segment build.
///
/// Construct via [`RenderConfigBuilder`]; unset fields fall back to the
/// defaults below.
///
/// ```
/// use showtape_rs::RenderConfigBuilder;
///
/// let config = RenderConfigBuilder::default()
///     .fps(25)
///     .character("walter".to_string())
///     .build()?;
/// assert_eq!(config.sample_rate, 24_000);
/// # Ok::<(), showtape_rs::RenderConfigBuilderError>(())
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct RenderConfig {
    /// Process-wide sample rate shared by all buffers in one build.
    pub sample_rate: u32,
    /// Fixed silence appended after every synthesized sentence.
    pub sentence_pad_sec: f64,
    /// Animation frames per second for coefficient sequences.
    pub fps: u32,
    /// Track identifier the animation output is keyed by.
    pub character: String,
    /// Per-effect timeline behavior.
    pub effects: EffectTable,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            sentence_pad_sec: 0.25,
            fps: 30,
            character: "anchor".to_string(),
            effects: EffectTable::builtin(),
        }
    }
}
